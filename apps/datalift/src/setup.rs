//! Startup checks

use datalift_config::Config;

use crate::error::CliError;

/// Validates the environment before a command runs
pub struct SystemSetup {
    config: Config,
}

impl SystemSetup {
    /// Create a new setup helper
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Perform startup checks and initialization
    ///
    /// Ensures the state directory exists and warns about missing
    /// credentials before any remote call is attempted.
    pub async fn initialize(&mut self) -> Result<(), CliError> {
        let state_dir = self.config.state_dir();
        tokio::fs::create_dir_all(&state_dir).await?;

        if self.config.auth.access_token.is_empty() {
            tracing::warn!(
                "no cloud access token configured; set DATALIFT_ACCESS_TOKEN or [auth] access_token"
            );
        }
        if self.config.auth.records_token.is_empty() {
            tracing::warn!(
                "no record-store token configured; set DATALIFT_RECORDS_TOKEN or [auth] records_token"
            );
        }

        Ok(())
    }

    /// Access the validated configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
