use otbeat_config::Config;
use tracing::info;

use super::CredentialPaths;

#[derive(Debug, Clone, Default)]
pub struct AuthInput {
    pub paths: CredentialPaths,
}

/// Strategy for running the OAuth consent flow and caching the token.
///
/// `report` runs the same flow on demand; this command lets it happen up
/// front, for example before scheduling unattended reports.
#[derive(Debug, Clone, Copy)]
pub struct AuthStrategy;

impl super::CommandStrategy for AuthStrategy {
    type Input = AuthInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let authenticator = super::build_authenticator(&config, input.paths)?;

        authenticator.run_consent_flow().await?;
        info!("Authorization complete");
        Ok(())
    }
}
