#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Gmail access for the workout report: OAuth token handling and a
//! [`SnippetSource`](otbeat_core::SnippetSource) backed by the Gmail REST API.

pub mod auth;
pub mod client;
mod error;
pub mod retry;
pub mod token;

pub use auth::{Authenticator, GMAIL_READONLY_SCOPE};
pub use client::{GmailClient, sender_query};
pub use error::{GmailError, Result};
pub use retry::{RetryPolicy, Retryable, retry_with_backoff};
pub use token::{ClientSecrets, StoredToken, TokenCache};
