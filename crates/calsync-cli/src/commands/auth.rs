//! Authorization command.

use tracing::info;

use crate::config::ClientConfig;
use crate::error::CliResult;

/// Makes sure a credential is stored, running the browser flow if needed.
pub async fn run(config: &ClientConfig, force: bool) -> CliResult<()> {
    let store = super::credential_store(config)?;
    let token_path = store.token_path().display().to_string();

    if force {
        store.clear()?;
    } else if store.load_if_exists().is_some() {
        println!("Already authorized, credential stored in {}.", token_path);
        println!("Use --force to authorize again.");
        return Ok(());
    }

    println!("Starting Google Calendar authorization...");
    println!();
    println!("A browser window will open for you to grant access.");
    println!("If it doesn't, open the URL printed below.");
    println!();

    store.resolve(&config.scopes).await?;

    info!("authorization successful");
    println!("Authorization successful!");
    println!("Credential saved to {}.", token_path);
    Ok(())
}
