// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use evalgate::banner;
use evalgate::client::{ApiClient, ListFilters};
use evalgate::config::{self, AppConfig, FileConfig};
use evalgate::errors::{EvalError, Result};
use evalgate::export::{self, SortKey};
use evalgate::models::RunStatus;
use evalgate::poller;
use evalgate::render;
use evalgate::summary::RunSummary;

#[derive(Parser)]
#[command(
    name = "evalgate",
    version,
    about = "Run eval suites against a scoring service and gate on the results"
)]
struct Cli {
    /// Base URL of the scoring service
    #[arg(long, env = "EVALGATE_API_BASE", global = true)]
    api_base: Option<String>,

    /// API key; falls back to the saved login
    #[arg(long, env = "EVALGATE_API_KEY", global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a suite file and track the run to completion
    Run {
        /// Path to the eval suite YAML file
        suite: PathBuf,

        /// Milliseconds between status polls
        #[arg(long, default_value_t = config::DEFAULT_POLL_INTERVAL_MS)]
        interval: u64,
    },
    /// Track an already-submitted run to completion
    Watch {
        /// Run identifier returned at submission
        run_id: String,

        /// Milliseconds between status polls
        #[arg(long, default_value_t = config::DEFAULT_POLL_INTERVAL_MS)]
        interval: u64,
    },
    /// List recent runs
    List(ListArgs),
    /// Export the complete run listing to a CSV file
    Export(ExportArgs),
    /// Ask the service to stop a queued or running run
    Cancel {
        /// Run identifier
        run_id: String,
    },
    /// Save the API key (and optionally the base URL) for later invocations
    Login,
}

#[derive(Parser)]
struct ListArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Page size
    #[arg(long, default_value_t = 50)]
    limit: u32,

    /// Listing offset
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

#[derive(Parser)]
struct ExportArgs {
    /// Output CSV path
    #[arg(short, long, default_value = "runs.csv")]
    output: PathBuf,

    /// Ordering applied to the complete set
    #[arg(long, value_enum, default_value_t = SortKey::Created)]
    sort: SortKey,

    /// Page size for the listing crawl
    #[arg(long, default_value_t = 100)]
    page_size: u32,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Parser)]
struct FilterArgs {
    /// Only runs with this status
    #[arg(long, value_enum)]
    status: Option<RunStatus>,

    /// Only runs at or above this success percentage
    #[arg(long)]
    min_success: Option<f64>,

    /// Only runs at or below this success percentage
    #[arg(long)]
    max_success: Option<f64>,

    /// Only runs at or below this cost in USD
    #[arg(long)]
    max_cost: Option<f64>,

    /// Only runs at or below this duration in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// Only runs created at or after this RFC 3339 timestamp
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// Only runs created at or before this RFC 3339 timestamp
    #[arg(long)]
    to: Option<DateTime<Utc>>,
}

impl FilterArgs {
    fn to_filters(&self) -> ListFilters {
        ListFilters {
            status: self.status,
            min_success: self.min_success,
            max_success: self.max_success,
            max_cost: self.max_cost,
            max_duration: self.max_duration,
            from: self.from,
            to: self.to,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    match dispatch(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Run { suite, interval } => handle_run(cli, suite, *interval).await,
        Commands::Watch { run_id, interval } => handle_watch(cli, run_id, *interval).await,
        Commands::List(args) => handle_list(cli, args).await,
        Commands::Export(args) => handle_export(cli, args).await,
        Commands::Cancel { run_id } => handle_cancel(cli, run_id).await,
        Commands::Login => handle_login(cli),
    }
}

fn build_client(cli: &Cli) -> Result<ApiClient> {
    let file = FileConfig::load(&config::config_file_path()?)?;
    let app_config = AppConfig::resolve(cli.api_base.clone(), cli.api_key.clone(), &file)?;
    Ok(ApiClient::new(reqwest::Client::new(), app_config))
}

async fn handle_run(cli: &Cli, suite: &Path, interval_ms: u64) -> Result<ExitCode> {
    banner::print_banner();
    let client = build_client(cli)?;

    let suite_yaml = fs::read_to_string(suite)?;
    println!("📡 Submitting {}...", suite.display());
    let run_id = client.submit_suite(&suite_yaml).await?;
    println!("🚀 Run {} accepted", run_id);

    track_run(&client, &run_id, Duration::from_millis(interval_ms)).await
}

async fn handle_watch(cli: &Cli, run_id: &str, interval_ms: u64) -> Result<ExitCode> {
    banner::print_banner();
    let client = build_client(cli)?;

    println!("📡 Watching run {}...", run_id);
    track_run(&client, run_id, Duration::from_millis(interval_ms)).await
}

/// Polls to a terminal state, renders as data arrives, and turns the final
/// pass rate into the process exit code.
async fn track_run(client: &ApiClient, run_id: &str, interval: Duration) -> Result<ExitCode> {
    let mut console = render::Console;
    let outcome = poller::poll_run(client, run_id, interval, &mut console).await?;

    match outcome.status {
        RunStatus::PartialFailure => render::print_partial_failure_notice(),
        RunStatus::TimedOut => render::print_timeout_notice(),
        _ => {}
    }

    let summary = RunSummary::from_outcome(&outcome);
    render::print_summary(&summary);

    if summary.is_acceptable() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

async fn handle_list(cli: &Cli, args: &ListArgs) -> Result<ExitCode> {
    let client = build_client(cli)?;
    let listing = client
        .list_runs(&args.filters.to_filters(), args.limit, args.offset)
        .await?;

    if listing.runs.is_empty() {
        println!("ℹ️  No runs matched.");
        return Ok(ExitCode::SUCCESS);
    }

    render::print_run_records(&listing.runs);
    println!(
        "\n📊 Showing {} of {} run(s)",
        listing.runs.len(),
        listing.pagination.total
    );
    if listing.pagination.has_more {
        println!(
            "   More available: rerun with --offset {}",
            args.offset + listing.runs.len() as u64
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_export(cli: &Cli, args: &ExportArgs) -> Result<ExitCode> {
    let client = build_client(cli)?;
    let source = client.runs_with(args.filters.to_filters());

    let count = export::export_csv(&source, args.page_size, args.sort, &args.output).await?;
    println!("💾 Exported {} run(s) to {}", count, args.output.display());
    Ok(ExitCode::SUCCESS)
}

async fn handle_cancel(cli: &Cli, run_id: &str) -> Result<ExitCode> {
    let client = build_client(cli)?;
    client.cancel_run(run_id).await?;
    println!("🛑 Cancel requested for run {}", run_id);
    Ok(ExitCode::SUCCESS)
}

fn handle_login(cli: &Cli) -> Result<ExitCode> {
    let Some(api_key) = cli.api_key.clone() else {
        return Err(EvalError::Config(
            "Provide --api-key (or set EVALGATE_API_KEY) to save credentials".to_string(),
        ));
    };

    let path = config::config_file_path()?;
    let mut file = FileConfig::load(&path)?;
    file.api_key = Some(api_key);
    if let Some(base) = cli.api_base.clone() {
        file.api_base = Some(base);
    }
    file.save(&path)?;

    println!("🔐 Saved credentials to {}", path.display());
    println!(
        "   API key: {}",
        config::masked_key(file.api_key.as_deref().unwrap_or(""))
    );
    Ok(ExitCode::SUCCESS)
}
