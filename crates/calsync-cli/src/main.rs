//! calsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use calsync_cli::cli::{Cli, Command, ConfigAction};
use calsync_cli::commands;
use calsync_cli::config::ClientConfig;
use calsync_cli::error::CliResult;
use calsync_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (Command::Serve { .. }, true) => TracingConfig::server().with_level(Level::DEBUG),
        (Command::Serve { .. }, false) => TracingConfig::server(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::cli(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let explicit = cli.config.as_deref();
    let config = ClientConfig::load(explicit)?;

    match cli.command {
        Command::Auth { force } => commands::auth::run(&config, force).await,
        Command::List { json } => commands::list::run(&config, json).await,
        Command::Create { file, rule } => commands::create::run(&config, &file, rule).await,
        Command::Serve { port, bind } => commands::serve::run(&config, port, bind).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, explicit),
            ConfigAction::Path => commands::config::path(explicit),
        },
    }
}
