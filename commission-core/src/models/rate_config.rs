use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CalculationTreatment, WithholdingRate};

/// Per-tier inputs to the commission calculation.
///
/// `rate` and `developers_rate` are both expressed in the same unit
/// (typically percent), so only their ratio matters. A zero `rate` forces
/// the tier's amounts to unset; a zero `developers_rate` is a configuration
/// anomaly with the same effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    pub rate: Decimal,
    pub developers_rate: Decimal,
    pub ewt_rate: WithholdingRate,
    pub calc_type: CalculationTreatment,
}

impl RateConfig {
    /// Stores a single field edit.
    pub fn apply(
        &mut self,
        field: RateField,
    ) {
        match field {
            RateField::Rate(rate) => self.rate = rate,
            RateField::DevelopersRate(rate) => self.developers_rate = rate,
            RateField::EwtRate(rate) => self.ewt_rate = rate,
            RateField::CalcType(calc_type) => self.calc_type = calc_type,
        }
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            rate: Decimal::new(40, 1),
            developers_rate: Decimal::new(50, 1),
            ewt_rate: WithholdingRate::default(),
            calc_type: CalculationTreatment::default(),
        }
    }
}

/// One editable field of a [`RateConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateField {
    Rate(Decimal),
    DevelopersRate(Decimal),
    EwtRate(WithholdingRate),
    CalcType(CalculationTreatment),
}
