//! The set of records sharing a developer/invoice key.
//!
//! A [`Group`] exclusively owns its [`CommissionRecord`]s. Every edit goes
//! through a group mutator, which stores the input on the record and hands
//! the resulting recompute request to the group's [`RecomputeScheduler`]:
//!
//! | Edit                    | Recompute                                   |
//! |-------------------------|---------------------------------------------|
//! | base commission         | all tiers, after the debounce window        |
//! | rate, treatment, EWT    | the edited tier, immediately                |
//! | descriptive metadata    | none                                        |
//!
//! Debounced work runs when the caller polls the group with the current
//! time, or when an async driver awaits [`Group::settle`].
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use commission_core::engine::Group;
//! use commission_core::{EngineConfig, GroupKey, SearchCandidate, Tier};
//!
//! let mut group = Group::new(GroupKey::new("Northpoint Land", "INV-001"), &EngineConfig::default())?;
//! let id = group.attach(
//!     SearchCandidate {
//!         agent_name: "Maria Santos".into(),
//!         developer_name: "Northpoint Land".into(),
//!         client_name: "J. Reyes".into(),
//!         reservation_date: None,
//!         base_amount_hint: None,
//!     },
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//! );
//!
//! let t0 = Instant::now();
//! group.update_base_commission(id, "10,200.00", t0)?;
//! assert_eq!(group.poll(t0 + Duration::from_millis(700)), 1);
//!
//! let record = group.record(id).unwrap();
//! assert_eq!(record.tier_result(Tier::Agent).net_commission, Some(dec!(7600.00)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::calculations::{GroupAggregator, GroupTotals, TierCalculator};
use crate::config::{ConfigError, EngineConfig};
use crate::engine::record::{CommissionRecord, DescriptiveField, Recompute};
use crate::engine::scheduler::{RecomputeKey, RecomputeScheduler, RecomputeScope};
use crate::{GroupKey, RateConfig, RateField, RecordId, RecordSnapshot, SearchCandidate, Tier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("record {0} is not part of this group")]
    UnknownRecord(RecordId),
}

#[derive(Debug)]
pub struct Group {
    key: GroupKey,
    records: Vec<CommissionRecord>,
    scheduler: RecomputeScheduler,
    calculator: TierCalculator,
    defaults: RateConfig,
    next_id: RecordId,
}

impl Group {
    /// Creates an empty group using the calculator constants, default rates
    /// and debounce window from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(
        key: GroupKey,
        config: &EngineConfig,
    ) -> Result<Self, ConfigError> {
        let calculator = config.tier_calculator()?;
        Ok(Self::with_parts(
            key,
            calculator,
            config.defaults.to_rate_config(),
            config.debounce(),
        ))
    }

    pub fn with_parts(
        key: GroupKey,
        calculator: TierCalculator,
        defaults: RateConfig,
        debounce: Duration,
    ) -> Self {
        Self {
            key,
            records: Vec::new(),
            scheduler: RecomputeScheduler::new(debounce),
            calculator,
            defaults,
            next_id: 1,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn records(&self) -> &[CommissionRecord] {
        &self.records
    }

    pub fn record(
        &self,
        id: RecordId,
    ) -> Option<&CommissionRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn scheduler(&self) -> &RecomputeScheduler {
        &self.scheduler
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record for a search result and returns its id.
    ///
    /// The record starts with an empty base commission and the group's
    /// default rates on every tier. The candidate's base amount hint is kept
    /// as metadata only.
    pub fn attach(
        &mut self,
        candidate: SearchCandidate,
        date: NaiveDate,
    ) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        let sequence_no = self.records.len() as u32 + 1;
        self.records.push(CommissionRecord::from_candidate(
            id,
            sequence_no,
            date,
            candidate,
            self.defaults,
        ));
        debug!(group = %self.key, record = id, sequence_no, "record attached");
        id
    }

    /// Removes a record, drops any recompute pending for it and renumbers the
    /// remaining records from 1.
    pub fn remove(
        &mut self,
        id: RecordId,
    ) -> Result<CommissionRecord, GroupError> {
        let index = self.index_of(id)?;
        self.scheduler.cancel(id);
        let removed = self.records.remove(index);
        for (position, record) in self.records.iter_mut().enumerate() {
            record.set_sequence_no(position as u32 + 1);
        }
        info!(group = %self.key, record = id, "record removed");
        Ok(removed)
    }

    /// Stores a raw base-commission edit and restarts the record's debounce
    /// window from `now`.
    pub fn update_base_commission(
        &mut self,
        id: RecordId,
        raw: &str,
        now: Instant,
    ) -> Result<(), GroupError> {
        let index = self.index_of(id)?;
        let request = self.records[index].update_base_commission(raw);
        self.dispatch(index, request, now);
        Ok(())
    }

    /// Stores a rate edit and recomputes the tier before returning.
    pub fn update_rate_config(
        &mut self,
        id: RecordId,
        tier: Tier,
        field: RateField,
    ) -> Result<(), GroupError> {
        let index = self.index_of(id)?;
        let request = self.records[index].update_rate_config(tier, field);
        self.dispatch(index, request, Instant::now());
        Ok(())
    }

    pub fn update_descriptive(
        &mut self,
        id: RecordId,
        field: DescriptiveField,
    ) -> Result<(), GroupError> {
        let index = self.index_of(id)?;
        let request = self.records[index].update_descriptive(field);
        self.dispatch(index, request, Instant::now());
        Ok(())
    }

    fn dispatch(
        &mut self,
        index: usize,
        request: Recompute,
        now: Instant,
    ) {
        let record = &mut self.records[index];
        match request {
            Recompute::None => {}
            Recompute::Debounced => {
                self.scheduler
                    .schedule_debounced(RecomputeKey::record(record.id()), now);
            }
            Recompute::Immediate(tier) => {
                let calculator = &self.calculator;
                self.scheduler
                    .run_immediate(RecomputeKey::tier(record.id(), tier), || {
                        record.recompute_tier(tier, calculator)
                    });
            }
        }
    }

    /// Runs every debounced recompute whose window closed at or before
    /// `now`. Returns the number of recomputes run.
    pub fn poll(
        &mut self,
        now: Instant,
    ) -> usize {
        let due = self.scheduler.take_due(now);
        for key in &due {
            if let Some(record) = self.records.iter_mut().find(|r| r.id() == key.record) {
                match key.scope {
                    RecomputeScope::Record => record.recompute_all(&self.calculator),
                    RecomputeScope::Tier(tier) => record.recompute_tier(tier, &self.calculator),
                }
            }
            self.scheduler.complete(*key);
        }
        due.len()
    }

    pub fn has_pending(&self) -> bool {
        self.scheduler.pending_count() > 0
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Waits for every pending debounce window to close and runs the
    /// recomputes. Returns the number of recomputes run.
    pub async fn settle(&mut self) -> usize {
        let mut ran = 0;
        while let Some(deadline) = self.next_deadline() {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            ran += self.poll(tokio::time::Instant::now().into_std());
        }
        debug!(group = %self.key, ran, "group settled");
        ran
    }

    /// Snapshots of every record in sequence order.
    pub fn snapshots(&self) -> Vec<RecordSnapshot> {
        self.records.iter().map(CommissionRecord::snapshot).collect()
    }

    /// Totals over the records' latest completed recomputes.
    pub fn totals(&self) -> GroupTotals {
        GroupAggregator::totals(&self.snapshots())
    }

    fn index_of(
        &self,
        id: RecordId,
    ) -> Result<usize, GroupError> {
        self.records
            .iter()
            .position(|record| record.id() == id)
            .ok_or(GroupError::UnknownRecord(id))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;
    use crate::{CalculationTreatment, TierResult};

    const DELAY: Duration = Duration::from_millis(700);

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn candidate(agent: &str) -> SearchCandidate {
        SearchCandidate {
            agent_name: agent.to_string(),
            developer_name: "Northpoint Land".to_string(),
            client_name: format!("Client of {agent}"),
            reservation_date: None,
            base_amount_hint: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn test_group() -> Group {
        Group::new(
            GroupKey::new("Northpoint Land", "INV-001"),
            &EngineConfig::default(),
        )
        .unwrap()
    }

    // =========================================================================
    // Membership tests
    // =========================================================================

    #[test]
    fn attach_assigns_ids_and_sequence_numbers() {
        let mut group = test_group();

        let first = group.attach(candidate("A"), date());
        let second = group.attach(candidate("B"), date());

        assert_eq!((first, second), (1, 2));
        let sequence: Vec<u32> = group.records().iter().map(|r| r.sequence_no()).collect();
        assert_eq!(sequence, vec![1, 2]);
    }

    #[test]
    fn remove_renumbers_and_cancels_pending_work() {
        let _guard = init_test_tracing();
        let mut group = test_group();
        let a = group.attach(candidate("A"), date());
        let b = group.attach(candidate("B"), date());
        let c = group.attach(candidate("C"), date());
        let t0 = Instant::now();
        group.update_base_commission(b, "5000", t0).unwrap();

        let removed = group.remove(b).unwrap();

        assert_eq!(removed.id(), b);
        assert!(!group.has_pending());
        assert_eq!(group.record(a).unwrap().sequence_no(), 1);
        assert_eq!(group.record(c).unwrap().sequence_no(), 2);
        assert_eq!(group.poll(t0 + DELAY), 0);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut group = test_group();
        let a = group.attach(candidate("A"), date());
        group.remove(a).unwrap();

        let b = group.attach(candidate("B"), date());

        assert_ne!(a, b);
    }

    #[test]
    fn unknown_record_is_an_error() {
        let mut group = test_group();

        assert_eq!(
            group.update_base_commission(99, "1", Instant::now()),
            Err(GroupError::UnknownRecord(99))
        );
        assert_eq!(group.remove(99).unwrap_err(), GroupError::UnknownRecord(99));
    }

    // =========================================================================
    // Debounce tests
    // =========================================================================

    #[test]
    fn rapid_base_edits_collapse_into_one_recompute_with_last_value() {
        let _guard = init_test_tracing();
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());
        let t0 = Instant::now();

        for (offset, raw) in [(0, "1"), (100, "10"), (200, "102"), (300, "10200")] {
            group
                .update_base_commission(id, raw, t0 + Duration::from_millis(offset))
                .unwrap();
        }

        assert_eq!(group.poll(t0 + Duration::from_millis(900)), 0);
        assert_eq!(group.poll(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(group.poll(t0 + Duration::from_secs(5)), 0);

        let record = group.record(id).unwrap();
        assert_eq!(record.revision(), 1);
        assert_eq!(record.base_commission(), Some(dec!(10200)));
        assert_eq!(
            record.tier_result(Tier::Agent).net_commission,
            Some(dec!(7600))
        );
    }

    #[test]
    fn snapshot_never_shows_a_value_mid_edit() {
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());
        let t0 = Instant::now();
        group.update_base_commission(id, "10200", t0).unwrap();
        group.poll(t0 + DELAY);

        group
            .update_base_commission(id, "20400", t0 + Duration::from_secs(2))
            .unwrap();
        let mid_edit = group.snapshots();

        assert_eq!(mid_edit[0].base_commission, Some(dec!(10200)));
        assert_eq!(mid_edit[0].agent.result.amount, Some(dec!(8000)));
        assert_eq!(group.totals().base_commission, dec!(10200));
    }

    #[test]
    fn separate_records_debounce_independently() {
        let mut group = test_group();
        let a = group.attach(candidate("A"), date());
        let b = group.attach(candidate("B"), date());
        let t0 = Instant::now();
        group.update_base_commission(a, "10200", t0).unwrap();
        group
            .update_base_commission(b, "5100", t0 + Duration::from_millis(500))
            .unwrap();

        assert_eq!(group.poll(t0 + DELAY), 1);

        assert_eq!(group.record(a).unwrap().revision(), 1);
        assert_eq!(group.record(b).unwrap().revision(), 0);
        assert_eq!(group.next_deadline(), Some(t0 + Duration::from_millis(1200)));
    }

    // =========================================================================
    // Immediate recompute tests
    // =========================================================================

    #[test]
    fn rate_edit_recomputes_only_that_tier_immediately() {
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());
        let t0 = Instant::now();
        group.update_base_commission(id, "10200", t0).unwrap();
        group.poll(t0 + DELAY);

        group
            .update_rate_config(
                id,
                Tier::UnitManager,
                RateField::CalcType(CalculationTreatment::VatWithInvoice),
            )
            .unwrap();

        let record = group.record(id).unwrap();
        assert_eq!(record.tier_result(Tier::UnitManager).vat, Some(dec!(960)));
        assert_eq!(record.tier_result(Tier::Agent).vat, None);
        assert_eq!(record.revision(), 2);
        assert!(!group.has_pending());
    }

    #[test]
    fn rate_edit_does_not_disturb_pending_base_edit() {
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());
        let t0 = Instant::now();
        group.update_base_commission(id, "10200", t0).unwrap();

        group
            .update_rate_config(id, Tier::Agent, RateField::Rate(dec!(2)))
            .unwrap();

        assert!(group.has_pending());
        assert_eq!(
            group.record(id).unwrap().tier_result(Tier::Agent),
            &TierResult::unset()
        );
        assert_eq!(group.poll(t0 + DELAY), 1);
        assert_eq!(
            group.record(id).unwrap().tier_result(Tier::Agent).amount,
            Some(dec!(4000))
        );
    }

    #[test]
    fn vat_deduction_leaves_previous_values() {
        let _guard = init_test_tracing();
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());
        let t0 = Instant::now();
        group.update_base_commission(id, "10200", t0).unwrap();
        group.poll(t0 + DELAY);
        let before = group.snapshots()[0].agent.result;

        group
            .update_rate_config(
                id,
                Tier::Agent,
                RateField::CalcType(CalculationTreatment::VatDeduction),
            )
            .unwrap();

        let record = group.record(id).unwrap();
        assert_eq!(record.tier_result(Tier::Agent), &before);
        assert_eq!(record.stale_tiers(), vec![Tier::Agent]);
    }

    #[test]
    fn descriptive_edit_runs_no_recompute() {
        let mut group = test_group();
        let id = group.attach(candidate("A"), date());

        group
            .update_descriptive(id, DescriptiveField::Status("for release".to_string()))
            .unwrap();

        assert_eq!(group.record(id).unwrap().revision(), 0);
        assert_eq!(group.snapshots()[0].status, "for release");
    }

    // =========================================================================
    // Totals tests
    // =========================================================================

    #[test]
    fn totals_follow_record_mutations() {
        let mut group = test_group();
        let a = group.attach(candidate("A"), date());
        let b = group.attach(candidate("B"), date());
        let t0 = Instant::now();
        group.update_base_commission(a, "10200", t0).unwrap();
        group.update_base_commission(b, "5100", t0).unwrap();
        group.poll(t0 + DELAY);

        assert_eq!(group.totals().agent.net_commission, dec!(11400));

        group.remove(b).unwrap();

        assert_eq!(group.totals().agent.net_commission, dec!(7600));
        assert_eq!(group.totals().record_count, 1);
    }

    // =========================================================================
    // settle tests
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn settle_waits_out_the_debounce_window() {
        let mut group = test_group();
        let a = group.attach(candidate("A"), date());
        let b = group.attach(candidate("B"), date());
        let now = tokio::time::Instant::now().into_std();
        group.update_base_commission(a, "10200", now).unwrap();
        group
            .update_base_commission(b, "5100", now + Duration::from_millis(300))
            .unwrap();

        let ran = group.settle().await;

        assert_eq!(ran, 2);
        assert!(!group.has_pending());
        assert_eq!(group.totals().agent.net_commission, dec!(11400));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_with_nothing_pending_returns_immediately() {
        let mut group = test_group();
        group.attach(candidate("A"), date());

        assert_eq!(group.settle().await, 0);
    }
}
