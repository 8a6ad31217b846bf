use std::path::PathBuf;
use std::sync::Arc;

use otbeat_config::Config;
use otbeat_core::{SortOrder, WorkoutSchema};
use otbeat_gmail::{GmailClient, sender_query};
use otbeat_report::{WorkoutReport, collect_workouts};
use tracing::info;

use super::CredentialPaths;

/// Input parameters for the Report command strategy.
///
/// Every `None` falls back to the config file.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    /// Sender address of the workout summary emails
    pub from: Option<String>,
    /// Output path; stdout when absent
    pub output: Option<PathBuf>,
    pub sort: Option<SortOrder>,
    pub concurrency: Option<usize>,
    pub paths: CredentialPaths,
}

/// Strategy for the Report command.
///
/// - Compiles the workout grammar
/// - Authorizes against Gmail (cached, refreshed or interactive)
/// - Fetches and parses every summary email from the sender
/// - Writes the sorted CSV report
#[derive(Debug, Clone, Copy)]
pub struct ReportStrategy;

impl super::CommandStrategy for ReportStrategy {
    type Input = ReportInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let schema = WorkoutSchema::compile()?;

        let sender = input.from.unwrap_or_else(|| config.gmail.sender.clone());
        let sort = input.sort.unwrap_or(config.report.sort);
        let concurrency = input
            .concurrency
            .unwrap_or(config.gmail.max_concurrency)
            .max(1);

        let authenticator = super::build_authenticator(&config, input.paths)?;
        let access_token = authenticator.access_token().await?;
        let client = Arc::new(GmailClient::new(access_token)?);

        info!("Searching for emails from {sender}");
        let outcome =
            collect_workouts(client, &schema, &sender_query(&sender), concurrency).await?;

        let report = WorkoutReport::new(outcome.summaries, sort);
        let output = super::open_output(input.output.as_deref())?;
        report.write_csv(output)?;

        match &input.output {
            Some(path) => info!(
                "Wrote {} workouts to {} ({sort} order)",
                report.summaries().len(),
                path.display()
            ),
            None => info!("Wrote {} workouts ({sort} order)", report.summaries().len()),
        }
        Ok(())
    }
}
