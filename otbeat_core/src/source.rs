use async_trait::async_trait;

/// Where workout snippets come from.
///
/// Implemented by the Gmail client; tests use in-memory sources.
#[async_trait]
pub trait SnippetSource: Send + Sync {
    /// Ids of every message matching `query`, in the order the source returns them.
    async fn list_message_ids(&self, query: &str) -> anyhow::Result<Vec<String>>;

    /// Snippet text of a single message.
    async fn fetch_snippet(&self, id: &str) -> anyhow::Result<String>;
}
