mod calculation_treatment;
mod commission_kind;
mod group_key;
mod rate_config;
mod search_candidate;
mod snapshot;
mod tier;
mod tier_result;
mod withholding_rate;

pub use calculation_treatment::CalculationTreatment;
pub use commission_kind::CommissionKind;
pub use group_key::GroupKey;
pub use rate_config::{RateConfig, RateField};
pub use search_candidate::SearchCandidate;
pub use snapshot::{RecordId, RecordSnapshot, TierSnapshot};
pub use tier::Tier;
pub use tier_result::TierResult;
pub use withholding_rate::WithholdingRate;
