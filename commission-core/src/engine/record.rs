use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::{TierCalculator, TierOutcome};
use crate::input::parse_amount;
use crate::{
    CommissionKind, RateConfig, RateField, RecordId, RecordSnapshot, SearchCandidate, Tier,
    TierResult, TierSnapshot,
};

/// Recompute work requested by a record mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    None,
    /// Recompute all tiers once the debounce window closes.
    Debounced,
    /// Recompute one tier right away.
    Immediate(Tier),
}

/// Metadata fields that never trigger a recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptiveField {
    ClientName(String),
    Status(String),
    Remarks(String),
    BdoAccount(String),
    Kind(CommissionKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TierState {
    config: RateConfig,
    result: TierResult,
    /// Set while the tier's treatment has no rule and `result` is carried
    /// over from an earlier calculation.
    stale: bool,
}

impl TierState {
    fn new(config: RateConfig) -> Self {
        Self {
            config,
            result: TierResult::unset(),
            stale: false,
        }
    }

    fn snapshot(&self) -> TierSnapshot {
        TierSnapshot {
            config: self.config,
            result: self.result,
        }
    }
}

/// One commission line: a base amount and three independently configured
/// tiers.
///
/// Mutators only store input and report what recompute they need; the
/// owning [`Group`](crate::engine::Group) decides when to run it. Tier
/// results are always derived from `base_commission`, the value committed
/// by the most recent whole-record recompute, so they never mix an old
/// base with a new one.
#[derive(Debug, Clone)]
pub struct CommissionRecord {
    id: RecordId,
    sequence_no: u32,
    date: NaiveDate,
    developer_name: String,
    agent_name: String,
    client_name: String,
    reservation_date: Option<NaiveDate>,
    base_amount_hint: Option<Decimal>,
    base_input: Option<Decimal>,
    base_commission: Option<Decimal>,
    commission_kind: CommissionKind,
    status: String,
    bdo_account: String,
    remarks: String,
    tiers: [TierState; 3],
    revision: u64,
}

impl CommissionRecord {
    /// Creates a record for a search result with an empty base commission
    /// and `defaults` on every tier.
    pub fn from_candidate(
        id: RecordId,
        sequence_no: u32,
        date: NaiveDate,
        candidate: SearchCandidate,
        defaults: RateConfig,
    ) -> Self {
        Self {
            id,
            sequence_no,
            date,
            developer_name: candidate.developer_name,
            agent_name: candidate.agent_name,
            client_name: candidate.client_name,
            reservation_date: candidate.reservation_date,
            base_amount_hint: candidate.base_amount_hint,
            base_input: None,
            base_commission: None,
            commission_kind: CommissionKind::default(),
            status: String::new(),
            bdo_account: String::new(),
            remarks: String::new(),
            tiers: [TierState::new(defaults); 3],
            revision: 0,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn sequence_no(&self) -> u32 {
        self.sequence_no
    }

    pub(crate) fn set_sequence_no(
        &mut self,
        sequence_no: u32,
    ) {
        self.sequence_no = sequence_no;
    }

    /// Base commission the current tier results were computed from.
    pub fn base_commission(&self) -> Option<Decimal> {
        self.base_commission
    }

    /// Whether a stored base edit has not been recomputed yet.
    pub fn has_pending_input(&self) -> bool {
        self.base_input != self.base_commission
    }

    pub fn rate_config(
        &self,
        tier: Tier,
    ) -> &RateConfig {
        &self.tiers[tier.index()].config
    }

    pub fn tier_result(
        &self,
        tier: Tier,
    ) -> &TierResult {
        &self.tiers[tier.index()].result
    }

    /// Tiers whose results were carried over because their treatment has no
    /// calculation rule.
    pub fn stale_tiers(&self) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|tier| self.tiers[tier.index()].stale)
            .collect()
    }

    /// Number of completed recomputes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stores a raw base-commission edit. The tiers keep their values until
    /// the debounced recompute runs.
    pub fn update_base_commission(
        &mut self,
        raw: &str,
    ) -> Recompute {
        self.base_input = parse_amount(raw);
        Recompute::Debounced
    }

    /// Stores a rate edit for `tier`.
    pub fn update_rate_config(
        &mut self,
        tier: Tier,
        field: RateField,
    ) -> Recompute {
        self.tiers[tier.index()].config.apply(field);
        Recompute::Immediate(tier)
    }

    pub fn update_descriptive(
        &mut self,
        field: DescriptiveField,
    ) -> Recompute {
        match field {
            DescriptiveField::ClientName(value) => self.client_name = value,
            DescriptiveField::Status(value) => self.status = value,
            DescriptiveField::Remarks(value) => self.remarks = value,
            DescriptiveField::BdoAccount(value) => self.bdo_account = value,
            DescriptiveField::Kind(kind) => self.commission_kind = kind,
        }
        Recompute::None
    }

    /// Commits the latest stored base and recomputes every tier from it.
    pub fn recompute_all(
        &mut self,
        calculator: &TierCalculator,
    ) {
        self.base_commission = self.base_input;
        for tier in Tier::ALL {
            self.apply_tier(tier, calculator);
        }
        self.revision += 1;
        debug!(record = self.id, revision = self.revision, "record recomputed");
    }

    /// Recomputes one tier against the committed base.
    pub fn recompute_tier(
        &mut self,
        tier: Tier,
        calculator: &TierCalculator,
    ) {
        self.apply_tier(tier, calculator);
        self.revision += 1;
        debug!(record = self.id, %tier, revision = self.revision, "tier recomputed");
    }

    fn apply_tier(
        &mut self,
        tier: Tier,
        calculator: &TierCalculator,
    ) {
        let state = &mut self.tiers[tier.index()];
        match calculator.calculate(tier, self.base_commission, &state.config) {
            TierOutcome::Computed(result) => {
                state.result = result;
                state.stale = false;
            }
            TierOutcome::Unsupported(calc_type) => {
                warn!(record = self.id, %tier, %calc_type, "tier left with previous values");
                state.stale = true;
            }
            TierOutcome::PayoutCleared(calc_type) => {
                warn!(record = self.id, %tier, %calc_type, "tier keeps previous net of VAT");
                state.result = TierResult {
                    net_of_vat: state.result.net_of_vat,
                    ..TierResult::unset()
                };
                state.stale = true;
            }
        }
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id,
            sequence_no: self.sequence_no,
            date: self.date,
            developer_name: self.developer_name.clone(),
            agent_name: self.agent_name.clone(),
            client_name: self.client_name.clone(),
            reservation_date: self.reservation_date,
            base_commission: self.base_commission,
            base_amount_hint: self.base_amount_hint,
            commission_kind: self.commission_kind,
            status: self.status.clone(),
            bdo_account: self.bdo_account.clone(),
            remarks: self.remarks.clone(),
            agent: self.tiers[Tier::Agent.index()].snapshot(),
            unit_manager: self.tiers[Tier::UnitManager.index()].snapshot(),
            team_leader: self.tiers[Tier::TeamLeader.index()].snapshot(),
        }
    }
}
