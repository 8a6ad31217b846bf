//! OAuth client secrets and the on-disk token cache.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GmailError, Result};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const OUT_OF_BAND_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens this close to their expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// OAuth client as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Parse a credentials file holding an `installed` or `web` client.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)?;
        file.installed.or(file.web).ok_or_else(|| {
            GmailError::InvalidCredentials(
                "expected an \"installed\" or \"web\" client".to_string(),
            )
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GmailError::CredentialsNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            GmailError::Json(err) => {
                GmailError::InvalidCredentials(format!("{}: {err}", path.display()))
            }
            other => other,
        })
    }

    /// First registered redirect URI, or the out-of-band one.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map_or(OUT_OF_BAND_REDIRECT, String::as_str)
    }
}

/// Access token plus what is needed to renew it.
///
/// Uses the field names of the common `token.json` layout
/// (`access_token`, `token_type`, `refresh_token`, `expiry`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Whether the token expires within the next minute.
    ///
    /// Tokens without an expiry (or with a zero-value one) are used as-is
    /// until the API rejects them.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.timestamp() > 0 => {
                expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
            }
            _ => false,
        }
    }

    /// Build a token from a token-endpoint response.
    ///
    /// Refresh responses usually omit `refresh_token`; `previous_refresh`
    /// keeps the one we already had.
    pub(crate) fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// Body returned by the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// JSON file holding the current [`StoredToken`].
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            debug!("No cached token at {}", self.path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the token, readable by the owner only.
    pub fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(serde_json::to_string_pretty(token)?.as_bytes())?;
        file.flush()?;
        debug!("Saved token to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expiry: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            access_token: "ya29.test".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry,
        }
    }

    #[test]
    fn installed_client_parses() {
        let secrets = ClientSecrets::from_json(
            r#"{
                "installed": {
                    "client_id": "123.apps.googleusercontent.com",
                    "project_id": "workouts",
                    "client_secret": "secret",
                    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                    "token_uri": "https://oauth2.googleapis.com/token",
                    "redirect_uris": ["http://localhost"]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret.as_deref(), Some("secret"));
        assert_eq!(secrets.redirect_uri(), "http://localhost");
    }

    #[test]
    fn web_client_parses_with_defaults() {
        let secrets =
            ClientSecrets::from_json(r#"{"web": {"client_id": "abc"}}"#).unwrap();
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secrets.redirect_uri(), OUT_OF_BAND_REDIRECT);
    }

    #[test]
    fn unknown_client_kind_is_rejected() {
        let err = ClientSecrets::from_json(r#"{"service_account": {}}"#).unwrap_err();
        assert!(matches!(err, GmailError::InvalidCredentials(_)));
    }

    #[test]
    fn token_file_layout_parses() {
        let token: StoredToken = serde_json::from_str(
            r#"{
                "access_token": "ya29.abc",
                "token_type": "Bearer",
                "refresh_token": "1//xyz",
                "expiry": "2021-06-14T10:00:00.123456-07:00"
            }"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.abc");
        assert_eq!(token.refresh_token.as_deref(), Some("1//xyz"));
        assert_eq!(
            token.expiry.map(|e| e.to_rfc3339()),
            Some("2021-06-14T17:00:00.123456+00:00".to_string())
        );
    }

    #[test]
    fn expiry_margin_applies() {
        let now = Utc::now();
        assert!(token(Some(now - Duration::hours(1))).is_expired(now));
        assert!(token(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(!token(Some(now + Duration::hours(1))).is_expired(now));
    }

    #[test]
    fn missing_or_zero_expiry_is_not_expired() {
        let now = Utc::now();
        assert!(!token(None).is_expired(now));
        let zero: StoredToken = serde_json::from_str(
            r#"{"access_token": "a", "expiry": "0001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(!zero.is_expired(now));
    }

    #[test]
    fn refresh_response_keeps_refresh_token() {
        let now = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "new", "expires_in": 3599}"#).unwrap();
        let refreshed =
            StoredToken::from_response(response, Some("1//old".to_string()), now);
        assert_eq!(refreshed.access_token, "new");
        assert_eq!(refreshed.token_type, "Bearer");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("1//old"));
        assert_eq!(refreshed.expiry, Some(now + Duration::seconds(3599)));
    }

    #[test]
    fn cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("nested").join("token.json"));
        assert_eq!(cache.load().unwrap(), None);

        let stored = token(Some(Utc::now()));
        cache.save(&stored).unwrap();
        assert_eq!(cache.load().unwrap(), Some(stored));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(cache.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
