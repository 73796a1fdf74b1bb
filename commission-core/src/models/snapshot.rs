use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CommissionKind, RateConfig, Tier, TierResult};
use crate::calculations::common::round_half_up;

/// Engine-assigned record identifier, unique within a session.
pub type RecordId = u64;

/// Inputs and computed fields of one tier at the last completed recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub config: RateConfig,
    pub result: TierResult,
}

/// Read-only view of a commission record handed to aggregation, export and
/// persistence.
///
/// `base_commission` is the value the tier results were computed from. An
/// edit still waiting on its debounce is not visible here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub sequence_no: u32,
    pub date: NaiveDate,
    pub developer_name: String,
    pub agent_name: String,
    pub client_name: String,
    pub reservation_date: Option<NaiveDate>,
    pub base_commission: Option<Decimal>,
    pub base_amount_hint: Option<Decimal>,
    pub commission_kind: CommissionKind,
    pub status: String,
    pub bdo_account: String,
    pub remarks: String,
    pub agent: TierSnapshot,
    pub unit_manager: TierSnapshot,
    pub team_leader: TierSnapshot,
}

impl RecordSnapshot {
    pub fn tier(
        &self,
        tier: Tier,
    ) -> &TierSnapshot {
        match tier {
            Tier::Agent => &self.agent,
            Tier::UnitManager => &self.unit_manager,
            Tier::TeamLeader => &self.team_leader,
        }
    }

    /// Presentation copy with every monetary field rounded to two places.
    pub fn rounded(&self) -> Self {
        let round_tier = |t: &TierSnapshot| TierSnapshot {
            config: t.config,
            result: t.result.rounded(),
        };
        Self {
            base_commission: self.base_commission.map(round_half_up),
            agent: round_tier(&self.agent),
            unit_manager: round_tier(&self.unit_manager),
            team_leader: round_tier(&self.team_leader),
            ..self.clone()
        }
    }
}
