//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::CliResult;

/// Print the effective configuration.
pub fn dump(config: &ClientConfig, explicit: Option<&Path>) -> CliResult<()> {
    match ClientConfig::path(explicit) {
        Some(path) => println!("# {}", path.display()),
        None => println!("# defaults (no configuration file)"),
    }
    println!("{}", config.to_toml()?);
    Ok(())
}

/// Show which configuration file is used.
pub fn path(explicit: Option<&Path>) -> CliResult<()> {
    match ClientConfig::path(explicit) {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: none, using defaults"),
    }
    Ok(())
}
