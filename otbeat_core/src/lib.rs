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

pub mod pattern;
pub mod source;
pub mod workout;

pub use pattern::{CompileError, Extractor, FieldSpec, MatchResult, Record, Schema};
pub use source::SnippetSource;
pub use workout::{
    CSV_HEADER, DEFAULT_SENDER, SortOrder, WorkoutError, WorkoutSchema, WorkoutSummary,
    sort_summaries, workout_schema,
};
