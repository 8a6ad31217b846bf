//! Gmail REST v1 client limited to what the report needs: listing message ids
//! for a search query and reading each message's snippet.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use otbeat_core::SnippetSource;

use crate::error::{GmailError, Result};
use crate::retry::{RetryPolicy, retry_with_backoff};

pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    snippet: String,
}

pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
    base_url: Url,
    retry: RetryPolicy,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every message id matching `query`, following `nextPageToken`.
    pub async fn list_messages(&self, query: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["users", "me", "messages"])?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let page: MessageListResponse = self.get_json(&url, &params).await?;
            debug!("Listed {} messages on this page", page.messages.len());
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Found {} messages matching {query:?}", ids.len());
        Ok(ids)
    }

    pub async fn message_snippet(&self, id: &str) -> Result<String> {
        let url = self.endpoint(&["users", "me", "messages", id])?;
        let detail: MessageDetail = self
            .get_json(&url, &[("format", "minimal".to_string())])
            .await?;
        Ok(detail.snippet)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GmailError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<T> {
        retry_with_backoff(
            || async move {
                let resp = self
                    .http
                    .get(url.clone())
                    .bearer_auth(&self.access_token)
                    .query(params)
                    .send()
                    .await?;

                let status = resp.status();
                if status == StatusCode::UNAUTHORIZED {
                    return Err(GmailError::AuthExpired);
                }
                if !status.is_success() {
                    let message = resp.text().await.unwrap_or_default();
                    return Err(GmailError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                Ok::<T, GmailError>(resp.json::<T>().await?)
            },
            &self.retry,
        )
        .await
    }
}

#[async_trait]
impl SnippetSource for GmailClient {
    async fn list_message_ids(&self, query: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.list_messages(query).await?)
    }

    async fn fetch_snippet(&self, id: &str) -> anyhow::Result<String> {
        Ok(self.message_snippet(id).await?)
    }
}

/// Gmail search query selecting messages from `sender`.
#[must_use]
pub fn sender_query(sender: &str) -> String {
    format!("from:{sender}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_extend_the_base_path() {
        let client = GmailClient::new("token").unwrap();
        let url = client
            .endpoint(&["users", "me", "messages", "17a2b3c4d5e6f789"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/17a2b3c4d5e6f789"
        );
    }

    #[test]
    fn ids_are_path_escaped() {
        let client = GmailClient::new("token")
            .unwrap()
            .with_base_url(Url::parse("http://127.0.0.1:8080/gmail/v1").unwrap());
        let url = client.endpoint(&["users", "me", "messages", "a/b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/gmail/v1/users/me/messages/a%2Fb"
        );
    }

    #[test]
    fn list_response_parses() {
        let page: MessageListResponse = serde_json::from_str(
            r#"{
                "messages": [
                    {"id": "17a", "threadId": "17a"},
                    {"id": "17b", "threadId": "17a"}
                ],
                "nextPageToken": "abc",
                "resultSizeEstimate": 2
            }"#,
        )
        .unwrap();
        let ids: Vec<_> = page.messages.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["17a", "17b"]);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_mailbox_parses() {
        let page: MessageListResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn minimal_message_parses() {
        let detail: MessageDetail = serde_json::from_str(
            r#"{"id": "17a", "labelIds": ["INBOX"], "snippet": "STUDIO WORKOUT SUMMARY Bothell, WA", "sizeEstimate": 1234}"#,
        )
        .unwrap();
        assert_eq!(detail.snippet, "STUDIO WORKOUT SUMMARY Bothell, WA");
    }

    #[test]
    fn query_filters_on_sender() {
        assert_eq!(
            sender_query("OTbeatReport@orangetheoryfitness.com"),
            "from:OTbeatReport@orangetheoryfitness.com"
        );
    }
}
