//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Where the HTTP surface listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind. Defaults to loopback.
    pub bind: IpAddr,

    /// TCP port. Defaults to 3001.
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 3001;

    pub fn new(bind: IpAddr, port: u16) -> Self {
        Self { bind, port }
    }

    /// Builder: set bind address.
    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST), Self::DEFAULT_PORT)
    }
}
