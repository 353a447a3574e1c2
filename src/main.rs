use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use replica_checker::config::{
    Cluster, ClusterRegistry, Collection, DEFAULT_WORKER_CAP, RetryPolicy, ScanConfig, Wiki,
};
use replica_checker::repair::{DirectiveFormat, WriterSink};
use replica_checker::scan::{FixedMaxId, Orchestrator, ScanReport};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const EXIT_BATCH_FAILURES: u8 = 1;
const EXIT_STARTUP_FAILURE: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// Output format for repair directives.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Format {
    /// Maintenance script invocations, one per line
    Command,
    /// JSON objects, one per line
    Json,
}

impl From<Format> for DirectiveFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Command => DirectiveFormat::Command,
            Format::Json => DirectiveFormat::Json,
        }
    }
}

/// Compare which documents exist on each search cluster and print repair
/// directives for every divergence.
///
/// Directives go to stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "replica-checker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Wiki database name (e.g. enwiki).
    #[arg(short, long)]
    wiki: Wiki,

    /// Cluster as <name>=<url>. Repeat for each cluster; the first is the reference.
    #[arg(short, long = "cluster", value_name = "NAME=URL", required = true)]
    clusters: Vec<Cluster>,

    /// Collection to check. Repeat for several; defaults to content and general.
    #[arg(long = "collection", value_name = "NAME")]
    collections: Vec<Collection>,

    /// Highest live identifier of the wiki.
    #[arg(long)]
    max_id: u64,

    /// Maximum number of parallel workers.
    #[arg(long, default_value_t = DEFAULT_WORKER_CAP)]
    workers: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Base delay between retries in milliseconds (0 retries immediately).
    #[arg(long, default_value = "0")]
    retry_backoff_ms: u64,

    /// Directive output format.
    #[arg(long, value_enum, default_value = "command")]
    format: Format,

    /// Re-sync divergent ids on every cluster, not only the divergent ones.
    #[arg(long)]
    resync_all: bool,

    /// Log ids found consistent (at debug level).
    #[arg(long)]
    log_sane: bool,

    /// Write a JSON scan report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => tracing::Level::WARN,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(report) if report.cancelled => ExitCode::from(EXIT_CANCELLED),
        Ok(report) if report.has_failures() => {
            tracing::warn!(
                "{} batches could not be checked, see errors above",
                report.batches_failed + report.workers_failed
            );
            ExitCode::from(EXIT_BATCH_FAILURES)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ScanReport> {
    let registry = ClusterRegistry::new(cli.clusters)?;

    let collections = if cli.collections.is_empty() {
        Collection::defaults()
    } else {
        cli.collections
    };
    let config = ScanConfig::new(cli.wiki)
        .with_collections(collections)
        .with_worker_cap(cli.workers)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_retry(RetryPolicy::with_backoff(Duration::from_millis(
            cli.retry_backoff_ms,
        )))
        .with_resync_all(cli.resync_all)
        .with_log_sane(cli.log_sane);

    let orchestrator = Orchestrator::new(config, registry)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping workers");
                cancel.cancel();
            }
        });
    }

    let sink = WriterSink::new(BufWriter::new(std::io::stdout()), cli.format.into());
    let (report, _sink) = orchestrator
        .run(&FixedMaxId(cli.max_id), sink, cancel)
        .await?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_vec_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(report)
}
