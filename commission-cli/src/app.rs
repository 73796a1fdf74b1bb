use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use commission_core::db::{DbConfig, RepositoryRegistry};
use commission_core::{
    CommissionReport, CommissionRepository, EngineConfig, Group, RecordId, save_all,
};
use commission_data::{EntrySheet, ReportCsvWriter};
use commission_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info, warn};

/// Everything one run of the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub entries: PathBuf,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
    pub record_date: NaiveDate,
    /// When set, every settled snapshot is stored through this backend.
    pub db: Option<DbConfig>,
}

/// What a run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub groups: usize,
    pub records: usize,
    pub stale_tiers: usize,
    pub saved: usize,
}

/// Build the repository registry with every backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Loads the engine configuration from `path`, or the defaults when no path
/// is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        debug!("no engine config given, using defaults");
        return Ok(EngineConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read engine config: {}", path.display()))?;
    EngineConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid engine config: {}", path.display()))
}

/// Parses the entry sheet at `path` and drives every row into its group.
/// Returns once no group has a recompute pending.
pub async fn build_groups(
    path: &Path,
    config: &EngineConfig,
    record_date: NaiveDate,
) -> Result<Vec<Group>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let rows = EntrySheet::parse(file)
        .with_context(|| format!("Failed to parse entry sheet: {}", path.display()))?;
    debug!(rows = rows.len(), "entry sheet parsed");

    let now = tokio::time::Instant::now().into_std();
    let mut groups = EntrySheet::build_groups(&rows, config, record_date, now)
        .with_context(|| format!("Failed to apply entry sheet: {}", path.display()))?;

    for group in &mut groups {
        group.settle().await;
        for record in group.records() {
            let stale = record.stale_tiers();
            if !stale.is_empty() {
                warn!(
                    group = %group.key(),
                    no = record.sequence_no(),
                    ?stale,
                    "record has tiers with stale values"
                );
            }
        }
    }

    Ok(groups)
}

/// Stores every group's snapshots in order, then deletes stored records that
/// are no longer part of their group. Stops at the first group that fails.
pub async fn persist(
    repo: &dyn CommissionRepository,
    groups: &[Group],
) -> Result<usize> {
    let mut saved = 0;
    for group in groups {
        let snapshots = group.snapshots();
        let ids = save_all(repo, group.key(), &snapshots)
            .await
            .with_context(|| format!("Failed to save group {}", group.key()))?;
        saved += ids.len();

        let keep: Vec<RecordId> = snapshots.iter().map(|snapshot| snapshot.id).collect();
        let pruned = repo
            .retain_records(group.key(), &keep)
            .await
            .with_context(|| format!("Failed to prune group {}", group.key()))?;
        if pruned > 0 {
            info!(group = %group.key(), pruned, "removed records deleted from storage");
        }
    }
    info!(saved, "snapshots stored");
    Ok(saved)
}

/// Runs the whole pipeline described by `options`.
pub async fn run(options: &RunOptions) -> Result<RunSummary> {
    let config = load_config(options.config.as_deref())?;
    let groups = build_groups(&options.entries, &config, options.record_date).await?;

    let report = CommissionReport::assemble(options.record_date, &groups);
    ReportCsvWriter::write_to_path(&options.output, &report)
        .with_context(|| format!("Failed to write report: {}", options.output.display()))?;

    let mut summary = RunSummary {
        groups: groups.len(),
        records: report.record_count(),
        stale_tiers: groups
            .iter()
            .flat_map(Group::records)
            .map(|record| record.stale_tiers().len())
            .sum(),
        saved: 0,
    };

    if let Some(db_config) = &options.db {
        debug!("connecting to {} backend", db_config.backend);
        let repo = build_registry().create(db_config).await?;
        summary.saved = persist(&*repo, &groups).await?;
    }

    info!(
        groups = summary.groups,
        records = summary.records,
        grand_base = %report.grand_totals.rounded().base_commission,
        "report complete"
    );
    Ok(summary)
}
