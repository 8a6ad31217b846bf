//! OAuth2 installed-app flow for read-only Gmail access.
//!
//! The consent step is manual: the authorization URL is printed, the user
//! approves access in a browser and pastes back either the code or the whole
//! redirect URL.

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

use crate::error::{GmailError, Result};
use crate::token::{ClientSecrets, StoredToken, TokenCache, TokenResponse};

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const STATE_TOKEN: &str = "otbeat-state";

/// Hands out valid access tokens, refreshing or re-authorizing as needed.
pub struct Authenticator {
    secrets: ClientSecrets,
    cache: TokenCache,
    http: reqwest::Client,
}

impl Authenticator {
    #[must_use]
    pub fn new(secrets: ClientSecrets, cache: TokenCache) -> Self {
        Self {
            secrets,
            cache,
            http: reqwest::Client::new(),
        }
    }

    /// URL the user opens to grant access.
    pub fn authorization_url(&self) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", self.secrets.redirect_uri()),
                ("response_type", "code"),
                ("scope", GMAIL_READONLY_SCOPE),
                ("access_type", "offline"),
                ("state", STATE_TOKEN),
            ],
        )?)
    }

    /// A usable access token.
    ///
    /// Order of preference: the cached token while it is fresh, a refreshed
    /// token, then the interactive consent flow. New tokens are written back
    /// to the cache.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.access_token);
            }

            if let Some(refresh_token) = token.refresh_token.clone() {
                match self.refresh(&refresh_token).await {
                    Ok(refreshed) => {
                        self.cache.save(&refreshed)?;
                        return Ok(refreshed.access_token);
                    }
                    Err(GmailError::AuthExpired) => {
                        warn!("Refresh token was rejected, authorization is required again");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let token = self.run_consent_flow().await?;
        Ok(token.access_token)
    }

    /// The cached token, if one can be read. An unreadable cache file counts
    /// as no token so the consent flow can replace it.
    fn cached_token(&self) -> Option<StoredToken> {
        match self.cache.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    "Ignoring unreadable token file {}: {e}",
                    self.cache.path().display()
                );
                None
            }
        }
    }

    /// Print the authorization URL, read the code from stdin and cache the
    /// resulting token.
    pub async fn run_consent_flow(&self) -> Result<StoredToken> {
        let auth_url = self.authorization_url()?;
        eprintln!(
            "Go to the following link in your browser, then paste the authorization code \
             (or the full URL you were redirected to):\n{auth_url}"
        );

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        let code = extract_code(&line)?;

        let token = self.exchange_code(&code).await?;
        info!("Saving credential file to: {}", self.cache.path().display());
        self.cache.save(&token)?;
        Ok(token)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken> {
        let mut form = vec![
            ("code", code),
            ("client_id", self.secrets.client_id.as_str()),
            ("redirect_uri", self.secrets.redirect_uri()),
            ("grant_type", "authorization_code"),
        ];
        if let Some(secret) = self.secrets.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.request_token(&form).await?;
        Ok(StoredToken::from_response(response, None, Utc::now()))
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let mut form = vec![
            ("refresh_token", refresh_token),
            ("client_id", self.secrets.client_id.as_str()),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.secrets.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        info!("Refreshing access token");
        let response = self.request_token(&form).await?;
        Ok(StoredToken::from_response(
            response,
            Some(refresh_token.to_string()),
            Utc::now(),
        ))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let resp = self
            .http
            .post(&self.secrets.token_uri)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_token_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn map_token_error(status: u16, body: &str) -> GmailError {
    if matches!(status, 400 | 401) && body.contains("invalid_grant") {
        return GmailError::AuthExpired;
    }
    GmailError::TokenExchange(format!("HTTP {status}: {body}"))
}

/// Pull the authorization code out of what the user pasted.
///
/// Accepts the bare code or a redirect URL carrying `code` (and optionally
/// `state` or `error`) in its query.
fn extract_code(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GmailError::AuthorizationCancelled(
            "no authorization code entered".to_string(),
        ));
    }

    if !input.contains("code=") && !input.contains("error=") {
        return Ok(input.to_string());
    }

    let query = Url::parse(input).map_or_else(
        |_| input.trim_start_matches('?').to_string(),
        |url| url.query().unwrap_or_default().to_string(),
    );

    let mut code = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => return Err(GmailError::AuthorizationCancelled(value.into_owned())),
            "state" if value != STATE_TOKEN => {
                return Err(GmailError::AuthorizationCancelled(
                    "state mismatch in redirect URL".to_string(),
                ));
            }
            _ => {}
        }
    }

    code.filter(|c| !c.is_empty()).ok_or_else(|| {
        GmailError::AuthorizationCancelled("redirect URL has no code".to_string())
    })
}
