//! Fetch snippets, match them against the workout grammar and keep the
//! workouts that parse.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use otbeat_core::{SnippetSource, WorkoutSchema, WorkoutSummary};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list messages: {0:#}")]
    List(anyhow::Error),

    #[error("failed to fetch message {id}: {error:#}")]
    Fetch { id: String, error: anyhow::Error },

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Workouts parsed from a batch, in input order, plus how many inputs were
/// skipped because they did not match.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub summaries: Vec<WorkoutSummary>,
    pub skipped: usize,
}

impl BatchOutcome {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.summaries.len() + self.skipped
    }
}

/// Match every snippet. Non-matching snippets are logged and skipped.
pub fn process_snippets<I, T>(schema: &WorkoutSchema, snippets: I) -> BatchOutcome
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut outcome = BatchOutcome::default();
    for snippet in snippets {
        let snippet = snippet.as_ref();
        match schema.parse(snippet) {
            Some(summary) => outcome.summaries.push(summary),
            None => {
                warn!("snippet did not match pattern, ignoring: {snippet}");
                outcome.skipped += 1;
            }
        }
    }
    outcome
}

/// List the messages matching `query`, fetch their snippets with at most
/// `max_concurrency` requests in flight, and parse them.
///
/// The first failed fetch aborts the whole batch.
pub async fn collect_workouts<S>(
    source: Arc<S>,
    schema: &WorkoutSchema,
    query: &str,
    max_concurrency: usize,
) -> Result<BatchOutcome, BatchError>
where
    S: SnippetSource + ?Sized + 'static,
{
    let ids = source
        .list_message_ids(query)
        .await
        .map_err(BatchError::List)?;
    info!(
        "Fetching {} messages, up to {} at a time",
        ids.len(),
        max_concurrency.max(1)
    );

    let snippets = fetch_snippets(source, ids, max_concurrency).await?;
    let outcome = process_snippets(schema, &snippets);
    info!(
        "Parsed {} workouts, skipped {} messages",
        outcome.summaries.len(),
        outcome.skipped
    );
    Ok(outcome)
}

/// Snippets in the same order as `ids`, whatever order the fetches finish in.
async fn fetch_snippets<S>(
    source: Arc<S>,
    ids: Vec<String>,
    max_concurrency: usize,
) -> Result<Vec<String>, BatchError>
where
    S: SnippetSource + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut slots: Vec<Option<String>> = vec![None; ids.len()];
    let mut tasks = JoinSet::new();

    for (index, id) in ids.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => source.fetch_snippet(&id).await,
                Err(e) => Err(e.into()),
            };
            (index, id, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, id, result) = joined?;
        match result {
            Ok(snippet) => {
                debug!("Fetched message {id}");
                slots[index] = Some(snippet);
            }
            Err(error) => {
                tasks.abort_all();
                return Err(BatchError::Fetch { id, error });
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
