use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use otbeat_core::{DEFAULT_SENDER, SortOrder};

const CONFIG_DIR_NAME: &str = "otbeat";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GmailConfig {
    /// Only messages from this address are read.
    #[serde(default = "GmailConfig::default_sender")]
    pub sender: String,
    /// OAuth client secrets downloaded from the Google Cloud console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    /// Cached access and refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
    /// Messages fetched in parallel.
    #[serde(default = "GmailConfig::default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            sender: Self::default_sender(),
            credentials_path: None,
            token_path: None,
            max_concurrency: Self::default_max_concurrency(),
        }
    }
}

impl GmailConfig {
    fn default_sender() -> String {
        DEFAULT_SENDER.to_string()
    }

    const fn default_max_concurrency() -> usize {
        8
    }

    pub fn credentials_path(&self) -> anyhow::Result<PathBuf> {
        resolve_path(self.credentials_path.as_deref(), "oauth.json")
    }

    pub fn token_path(&self) -> anyhow::Result<PathBuf> {
        resolve_path(self.token_path.as_deref(), "token.json")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ReportConfig {
    #[serde(default)]
    pub sort: SortOrder,
}

fn resolve_path(configured: Option<&Path>, default_name: &str) -> anyhow::Result<PathBuf> {
    match configured {
        Some(path) => expand_home(path),
        None => Ok(Config::config_dir()?.join(default_name)),
    }
}

fn expand_home(path: &Path) -> anyhow::Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(home_dir()?.join(CONFIG_DIR_NAME))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load `~/otbeat/config.json`, falling back to defaults when it is absent.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let config = Self::load_from(&config_path)?;
        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if config.gmail.max_concurrency == 0 {
            anyhow::bail!("gmail.max_concurrency must be at least 1");
        }

        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        Self::create_config_at(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!(
            "   1. Create an OAuth client (Desktop app) with the Gmail API enabled and save its JSON as {}",
            config_dir.join("oauth.json").display()
        );
        println!("   2. Run 'otbeat auth' to authorize read-only Gmail access");
        println!("   3. Run 'otbeat report -o workouts.csv'");
        println!();
        println!("🔧 Configuration options:");
        println!("   - gmail.sender: address the workout summaries come from");
        println!("   - gmail.credentials_path / gmail.token_path: override file locations");
        println!("   - gmail.max_concurrency: messages fetched in parallel");
        println!("   - report.sort: 'lexicographic' (default) or 'calendar'");
        println!();
        Ok(())
    }

    /// Defaults with the credential and token locations spelled out, so the
    /// written file shows every key.
    #[must_use]
    pub fn template() -> Self {
        let home_relative = |name: &str| PathBuf::from("~").join(CONFIG_DIR_NAME).join(name);
        Self {
            gmail: GmailConfig {
                credentials_path: Some(home_relative("oauth.json")),
                token_path: Some(home_relative("token.json")),
                ..GmailConfig::default()
            },
            report: ReportConfig::default(),
        }
    }

    /// Write the template config to `path`. Refuses to overwrite.
    pub fn create_config_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        let template = serde_json::to_string_pretty(&Self::template())?;
        std::fs::write(path, template)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}
