use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commission_cli::app::{self, RunOptions};
use commission_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Commission report generator.
///
/// Applies an entry sheet to the commission engine, writes the per-group
/// report as CSV, and optionally stores every record in a database.
#[derive(Debug, Parser)]
#[command(name = "commission-report")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Entry sheet CSV, one row per sale.
    entries: PathBuf,

    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the report CSV.
    #[arg(short, long, default_value = "commission-report.csv")]
    output: PathBuf,

    /// Date stamped on new records and on the report (YYYY-MM-DD).
    /// Defaults to today.
    #[arg(long)]
    record_date: Option<NaiveDate>,

    /// Database backend to use when `--db` is given.
    #[arg(long, default_value = "sqlite")]
    backend: String,

    /// Database connection string. Records are only stored when this is set.
    /// For SQLite this is a file path (e.g. `commissions.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// Honours `RUST_LOG` when set and falls back to `info`. Timestamps and
/// target names are stripped.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let options = RunOptions {
        entries: cli.entries,
        config: cli.config,
        output: cli.output,
        record_date: cli
            .record_date
            .unwrap_or_else(|| Local::now().date_naive()),
        db: DbConfig::from_flags(&cli.backend, cli.db),
    };

    let summary = app::run(&options).await?;
    info!(
        "{} records in {} groups written to {}",
        summary.records,
        summary.groups,
        options.output.display()
    );
    if summary.stale_tiers > 0 {
        info!(
            "{} tier(s) use an unsupported treatment and kept their previous values",
            summary.stale_tiers
        );
    }

    Ok(())
}
