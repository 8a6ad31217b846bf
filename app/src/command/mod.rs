//! Static strategy pattern for CLI commands.
//!
//! Each command is its own strategy type with its own input type, dispatched
//! statically from `main`.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use otbeat_config::Config;
use otbeat_gmail::{Authenticator, ClientSecrets, TokenCache};
use tracing::info;

mod auth;
mod info;
mod init;
mod parse;
mod report;
mod version;

pub use auth::{AuthInput, AuthStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use parse::{OutputFormat, ParseInput, ParseStrategy};
pub use report::{ReportInput, ReportStrategy};
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Credential and token locations, CLI flags taking precedence over config.
#[derive(Debug, Clone, Default)]
pub struct CredentialPaths {
    pub credentials: Option<PathBuf>,
    pub token: Option<PathBuf>,
}

impl CredentialPaths {
    fn resolve(self, config: &Config) -> anyhow::Result<(PathBuf, PathBuf)> {
        let credentials = match self.credentials {
            Some(path) => path,
            None => config.gmail.credentials_path()?,
        };
        let token = match self.token {
            Some(path) => path,
            None => config.gmail.token_path()?,
        };
        Ok((credentials, token))
    }
}

fn build_authenticator(config: &Config, paths: CredentialPaths) -> anyhow::Result<Authenticator> {
    let (credentials_path, token_path) = paths.resolve(config)?;
    info!("Using OAuth client from {}", credentials_path.display());

    let secrets = ClientSecrets::load(&credentials_path).with_context(|| {
        format!(
            "Cannot load OAuth client secrets. Download a Desktop OAuth client JSON and save it as {}",
            credentials_path.display()
        )
    })?;

    Ok(Authenticator::new(secrets, TokenCache::new(token_path)))
}

/// The output file, created or truncated, or stdout when no path is given.
fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("error opening output file {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
