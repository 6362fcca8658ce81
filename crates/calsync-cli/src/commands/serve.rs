//! Running the HTTP surface.

use std::net::IpAddr;
use std::sync::Arc;

use calsync_providers::CalendarProvider;
use calsync_server::AppState;

use crate::config::ClientConfig;
use crate::error::CliResult;

pub async fn run(config: &ClientConfig, port: Option<u16>, bind: Option<IpAddr>) -> CliResult<()> {
    let mut server_config = config.server_config();
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }
    if let Some(bind) = bind {
        server_config = server_config.with_bind(bind);
    }

    let provider: Arc<dyn CalendarProvider> = Arc::new(super::google_provider(config)?);
    let state = AppState::new(
        super::credential_store(config)?,
        super::workflow(config, provider),
    );

    calsync_server::serve(&server_config, state).await?;
    Ok(())
}
