use crate::api::{self, ApiConfig};
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            log_errors,
        } => {
            let dsn = Url::parse(&dsn).context("Invalid database DSN")?;

            api::new(port, dsn.to_string(), ApiConfig { log_errors }).await?;
        }
    }

    Ok(())
}
