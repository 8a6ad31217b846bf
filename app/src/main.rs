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

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use otbeat_core::SortOrder;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    AuthInput, AuthStrategy, CommandStrategy, CredentialPaths, InfoStrategy, InitStrategy,
    OutputFormat, ParseInput, ParseStrategy, ReportInput, ReportStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "otbeat")]
#[command(about = "Export workout summary emails to a CSV report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch workout summaries from Gmail and write the CSV report
    Report {
        /// Sender of the workout summary emails
        #[arg(long)]
        from: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Row order: lexicographic or calendar
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Messages fetched in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// OAuth client secrets file
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Cached token file
        #[arg(long)]
        token: Option<PathBuf>,
    },
    /// Parse snippets (one per line) from a file or stdin
    Parse {
        /// Snippet file (defaults to stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// JSON schema to use instead of the workout grammar
        #[arg(short = 's', long)]
        schema: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,

        /// Row order for the workout CSV
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Output file (defaults to stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Authorize read-only Gmail access and cache the token
    Auth {
        /// OAuth client secrets file
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Cached token file
        #[arg(long)]
        token: Option<PathBuf>,
    },
    /// Show the effective configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the CSV on stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            from,
            output,
            sort,
            concurrency,
            credentials,
            token,
        } => {
            ReportStrategy
                .execute(ReportInput {
                    from,
                    output,
                    sort,
                    concurrency,
                    paths: CredentialPaths { credentials, token },
                })
                .await
        }
        Commands::Parse {
            input,
            schema,
            format,
            sort,
            output,
        } => {
            ParseStrategy
                .execute(ParseInput {
                    input,
                    schema,
                    format,
                    sort,
                    output,
                })
                .await
        }
        Commands::Auth { credentials, token } => {
            AuthStrategy
                .execute(AuthInput {
                    paths: CredentialPaths { credentials, token },
                })
                .await
        }
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::try_parse_from([
            "otbeat",
            "report",
            "--from",
            "coach@example.com",
            "-o",
            "workouts.csv",
            "--sort",
            "calendar",
        ])
        .unwrap();

        let Commands::Report {
            from, output, sort, ..
        } = cli.command
        else {
            panic!("expected report command");
        };
        assert_eq!(from.as_deref(), Some("coach@example.com"));
        assert_eq!(output, Some(PathBuf::from("workouts.csv")));
        assert_eq!(sort, Some(SortOrder::Calendar));
    }

    #[test]
    fn report_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["otbeat", "report"]).unwrap();
        let Commands::Report {
            from, output, sort, ..
        } = cli.command
        else {
            panic!("expected report command");
        };
        assert!(from.is_none());
        assert!(output.is_none());
        assert!(sort.is_none());
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        assert!(Cli::try_parse_from(["otbeat", "report", "--sort", "random"]).is_err());
    }

    #[test]
    fn parse_format_flag() {
        let cli = Cli::try_parse_from(["otbeat", "parse", "-f", "json"]).unwrap();
        let Commands::Parse { format, .. } = cli.command else {
            panic!("expected parse command");
        };
        assert_eq!(format, Some(OutputFormat::Json));
    }
}
