//! `casewatch` - look up Delhi High Court cases from the command line.

use anyhow::Context;
use casewatch_core::{list_case_types, AppConfig, CaseQuery, FetchMode};
use casewatch_fetcher::{FetchOrchestrator, RetryPolicy};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "casewatch",
    about = "Court case lookup for the Delhi High Court case-status search",
    version
)]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the case types accepted by the search form.
    CaseTypes,

    /// Look up one case and print the outcome as JSON.
    Lookup {
        /// Case type code, e.g. "W.P.(C)".
        #[arg(long)]
        case_type: String,

        /// Case number digits.
        #[arg(long)]
        number: String,

        /// Filing year.
        #[arg(long)]
        year: String,

        /// live, synthetic or fallback (defaults to the configured mode).
        #[arg(long)]
        mode: Option<FetchMode>,

        /// Seed for reproducible synthetic records.
        #[arg(long)]
        seed: Option<u64>,

        /// Extra attempts after a network or timeout failure.
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn,casewatch=info",
        1 => "info,casewatch=debug",
        _ => "debug,casewatch=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::CaseTypes => {
            for option in list_case_types() {
                println!("{:<14}{}", option.code, option.label);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Lookup {
            case_type,
            number,
            year,
            mode,
            seed,
            retries,
        } => {
            let query = match CaseQuery::parse(&case_type, &number, &year) {
                Ok(query) => query,
                Err(errors) => {
                    for error in errors.iter() {
                        eprintln!("error: {error}");
                    }
                    return Ok(ExitCode::from(2));
                }
            };

            let mut config = AppConfig::load_with_env(cli.config.as_deref())
                .context("failed to load configuration")?;
            if let Some(seed) = seed {
                config.fetch.synthetic_seed = Some(seed);
            }
            let mode = mode.unwrap_or(config.fetch.mode);

            let orchestrator = FetchOrchestrator::from_app_config(&config)
                .context("failed to set up the lookup pipeline")?;
            let policy = RetryPolicy {
                max_attempts: retries.saturating_add(1),
                ..RetryPolicy::default()
            };

            let outcome = orchestrator
                .fetch_case_with_retry(&query, mode, &policy)
                .await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
