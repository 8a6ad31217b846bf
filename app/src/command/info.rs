use chrono::Utc;
use otbeat_config::Config;
use otbeat_gmail::TokenCache;
use tracing::info;

/// Strategy for displaying the effective configuration.
///
/// Shows:
/// - Config file location
/// - Gmail sender, concurrency and credential file locations
/// - Cached token status (never the token itself)
/// - Report sort order
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let config_path = Config::config_path()?;

        println!("=== otbeat Configuration ===\n");

        println!("Config File:");
        println!(
            "  {} ({})",
            config_path.display(),
            if config_path.exists() { "found" } else { "defaults" }
        );
        println!();

        println!("Gmail:");
        println!("  Sender: {}", config.gmail.sender);
        println!("  Max Concurrency: {}", config.gmail.max_concurrency);
        let credentials_path = config.gmail.credentials_path()?;
        println!(
            "  Credentials: {} ({})",
            credentials_path.display(),
            if credentials_path.exists() { "found" } else { "missing" }
        );

        let token_path = config.gmail.token_path()?;
        info!("Reading cached token");
        let status = match TokenCache::new(&token_path).load() {
            Ok(Some(token)) if token.is_expired(Utc::now()) => {
                if token.refresh_token.is_some() {
                    "expired, refreshable".to_string()
                } else {
                    "expired".to_string()
                }
            }
            Ok(Some(_)) => "valid".to_string(),
            Ok(None) => "not authorized yet".to_string(),
            Err(e) => format!("unreadable: {e}"),
        };
        println!("  Token: {} ({status})", token_path.display());
        println!();

        println!("Report:");
        println!("  Sort: {}", config.report.sort);

        Ok(())
    }
}
