//! Commission calculation engine.
//!
//! Records are grouped by developer invoice. Each record carries a base
//! commission and three tiers (Agent, Unit Manager, Team Leader) whose
//! payouts are derived from it by [`TierCalculator`]. A [`Group`] owns its
//! records, debounces base-commission edits and recomputes rate edits
//! immediately; [`GroupAggregator`] sums the results for reporting.
//!
//! Persistence and export live outside the engine. They consume
//! [`RecordSnapshot`]s through [`CommissionRepository`] and
//! [`CommissionReport`].

pub mod calculations;
pub mod config;
pub mod db;
pub mod engine;
pub mod input;
pub mod models;
pub mod report;

pub use calculations::{GroupAggregator, GroupTotals, TierCalculator, TierOutcome, TierTotals};
pub use config::{ConfigError, DefaultRates, EngineConfig};
pub use db::{CommissionRepository, RepositoryError, SaveError, StoredRecord, save_all};
pub use engine::{CommissionRecord, DescriptiveField, Group, GroupError};
pub use models::*;
pub use report::{CommissionReport, GroupReport};
