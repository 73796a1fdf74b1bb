//! Per-tier commission calculation.
//!
//! A tier's payout is derived from the record's base commission and the
//! tier's [`RateConfig`]. The derivation depends on the calculation
//! treatment:
//!
//! | Treatment              | Net of VAT  | Amount                 | VAT          | EWT          | Net commission         |
//! |------------------------|-------------|------------------------|--------------|--------------|------------------------|
//! | nonvat with invoice    | base ÷ 1.02 | nov × rate ÷ dev rate  | unset        | amount × ewt | amount − ewt           |
//! | nonvat without invoice | unset       | base × rate ÷ dev rate | unset        | unset        | base × rate ÷ dev rate |
//! | vat with invoice       | base ÷ 1.02 | nov × rate ÷ dev rate  | amount × 12% | amount × ewt | amount + vat − ewt     |
//! | vat deduction          | kept        | kept                   | kept         | kept         | kept                   |
//!
//! Under `nonvat without invoice` the Agent tier leaves `amount` unset while
//! the Unit Manager and Team Leader tiers populate it.
//!
//! # Edge rules
//!
//! - A zero `rate` unsets amount, VAT, EWT and net commission under every
//!   treatment.
//! - A zero `developers_rate` (or any arithmetic overflow) unsets the fields
//!   that depend on it instead of producing infinity.
//! - A base commission that was never entered unsets every field.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use commission_core::calculations::TierCalculator;
//! use commission_core::{CalculationTreatment, RateConfig, Tier, WithholdingRate};
//!
//! let calculator = TierCalculator::default();
//! let rates = RateConfig {
//!     rate: dec!(4.0),
//!     developers_rate: dec!(5.0),
//!     ewt_rate: WithholdingRate::FivePercent,
//!     calc_type: CalculationTreatment::NonVatWithInvoice,
//! };
//!
//! let result = calculator
//!     .calculate(Tier::Agent, Some(dec!(10200.00)), &rates)
//!     .computed()
//!     .unwrap();
//!
//! assert_eq!(result.net_of_vat, Some(dec!(10000.00)));
//! assert_eq!(result.amount, Some(dec!(8000.00)));
//! assert_eq!(result.ewt, Some(dec!(400.00)));
//! assert_eq!(result.net_commission, Some(dec!(7600.00)));
//! assert_eq!(result.vat, None);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{checked_ratio, portion, share};
use crate::{CalculationTreatment, RateConfig, Tier, TierResult};

/// Errors raised when building a [`TierCalculator`] from invalid constants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculatorConfigError {
    /// The divisor that backs VAT out of the base must be positive.
    #[error("net-of-VAT divisor must be positive, got {0}")]
    InvalidNetOfVatDivisor(Decimal),

    /// The VAT rate must be between 0 and 1.
    #[error("VAT rate must be between 0 and 1, got {0}")]
    InvalidVatRate(Decimal),
}

/// Constants shared by every tier calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Divisor applied to the base commission under the with-invoice
    /// treatments. Typically 1.02.
    pub net_of_vat_divisor: Decimal,

    /// VAT applied to the gross amount under `vat with invoice`. Typically 12%.
    pub vat_rate: Decimal,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            net_of_vat_divisor: Decimal::new(102, 2),
            vat_rate: Decimal::new(12, 2),
        }
    }
}

impl CalculatorConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`CalculatorConfigError`] if:
    /// - `net_of_vat_divisor` is zero or negative
    /// - `vat_rate` is not in [0, 1]
    pub fn validate(&self) -> Result<(), CalculatorConfigError> {
        if self.net_of_vat_divisor <= Decimal::ZERO {
            return Err(CalculatorConfigError::InvalidNetOfVatDivisor(
                self.net_of_vat_divisor,
            ));
        }
        if self.vat_rate < Decimal::ZERO || self.vat_rate > Decimal::ONE {
            return Err(CalculatorConfigError::InvalidVatRate(self.vat_rate));
        }
        Ok(())
    }
}

/// Outcome of a single tier calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOutcome {
    /// Freshly derived fields that replace the tier's current result.
    Computed(TierResult),

    /// The treatment has no calculation rule; the caller keeps whatever the
    /// tier held before.
    Unsupported(CalculationTreatment),

    /// The rate forces the four payout amounts to unset, but the treatment
    /// has no rule for `net_of_vat`; the caller keeps the previous one.
    PayoutCleared(CalculationTreatment),
}

impl TierOutcome {
    /// The computed result, or `None` for an unsupported treatment.
    pub fn computed(self) -> Option<TierResult> {
        match self {
            Self::Computed(result) => Some(result),
            Self::Unsupported(_) | Self::PayoutCleared(_) => None,
        }
    }
}

/// Pure calculator for one tier's derived fields.
///
/// The calculator holds no state beyond its constants; calling
/// [`calculate`](Self::calculate) twice with the same inputs yields the
/// same decimals.
#[derive(Debug, Clone, Default)]
pub struct TierCalculator {
    config: CalculatorConfig,
}

impl TierCalculator {
    /// Creates a calculator after validating its constants.
    ///
    /// # Errors
    ///
    /// Returns [`CalculatorConfigError`] if the configuration is invalid.
    pub fn new(config: CalculatorConfig) -> Result<Self, CalculatorConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Derives the fields of `tier` from `base_commission` and `rates`.
    ///
    /// Never fails: anomalous inputs produce unset fields, and the
    /// unsupported `VatDeduction` treatment is reported through
    /// [`TierOutcome::Unsupported`].
    pub fn calculate(
        &self,
        tier: Tier,
        base_commission: Option<Decimal>,
        rates: &RateConfig,
    ) -> TierOutcome {
        let calc_type = rates.calc_type;

        if rates.rate <= Decimal::ZERO {
            if rates.rate < Decimal::ZERO {
                warn!(%tier, %calc_type, rate = %rates.rate, "negative rate treated as zero");
            }
            debug!(%tier, %calc_type, "zero rate; payout fields unset");
            if calc_type == CalculationTreatment::VatDeduction {
                return TierOutcome::PayoutCleared(calc_type);
            }
            return TierOutcome::Computed(TierResult {
                net_of_vat: base_commission.and_then(|base| self.net_of_vat(base, calc_type)),
                ..TierResult::unset()
            });
        }

        let base = match (calc_type, base_commission) {
            (CalculationTreatment::VatDeduction, _) => {
                warn!(%tier, %calc_type, "no calculation rule for treatment; keeping previous values");
                return TierOutcome::Unsupported(calc_type);
            }
            (_, None) => return TierOutcome::Computed(TierResult::unset()),
            (_, Some(base)) => base,
        };

        if rates.developers_rate <= Decimal::ZERO {
            warn!(
                %tier,
                %calc_type,
                developers_rate = %rates.developers_rate,
                "developers rate is not positive; payout fields unset"
            );
            return TierOutcome::Computed(TierResult {
                net_of_vat: self.net_of_vat(base, calc_type),
                ..TierResult::unset()
            });
        }

        let result = match calc_type {
            CalculationTreatment::NonVatWithInvoice => self.nonvat_with_invoice(base, rates),
            CalculationTreatment::NonVatWithoutInvoice => {
                self.nonvat_without_invoice(tier, base, rates)
            }
            CalculationTreatment::VatWithInvoice => self.vat_with_invoice(base, rates),
            CalculationTreatment::VatDeduction => return TierOutcome::Unsupported(calc_type),
        };
        TierOutcome::Computed(result)
    }

    /// Base commission with VAT backed out, for the treatments that use it.
    fn net_of_vat(
        &self,
        base: Decimal,
        calc_type: CalculationTreatment,
    ) -> Option<Decimal> {
        if !calc_type.uses_invoice() {
            return None;
        }
        checked_ratio(base, self.config.net_of_vat_divisor)
    }

    fn nonvat_with_invoice(
        &self,
        base: Decimal,
        rates: &RateConfig,
    ) -> TierResult {
        let net_of_vat = checked_ratio(base, self.config.net_of_vat_divisor);
        let amount = net_of_vat.and_then(|nov| share(nov, rates.rate, rates.developers_rate));
        let ewt = amount.and_then(|a| portion(a, rates.ewt_rate.as_decimal()));
        let net_commission = match (amount, ewt) {
            (Some(a), Some(w)) => a.checked_sub(w),
            _ => None,
        };

        TierResult {
            net_of_vat,
            amount,
            vat: None,
            ewt,
            net_commission,
        }
    }

    /// Net commission comes straight from the base for every tier, while the
    /// Agent tier leaves `amount` unset.
    fn nonvat_without_invoice(
        &self,
        tier: Tier,
        base: Decimal,
        rates: &RateConfig,
    ) -> TierResult {
        let direct = share(base, rates.rate, rates.developers_rate);

        TierResult {
            net_of_vat: None,
            amount: if tier == Tier::Agent { None } else { direct },
            vat: None,
            ewt: None,
            net_commission: direct,
        }
    }

    fn vat_with_invoice(
        &self,
        base: Decimal,
        rates: &RateConfig,
    ) -> TierResult {
        let net_of_vat = checked_ratio(base, self.config.net_of_vat_divisor);
        let amount = net_of_vat.and_then(|nov| share(nov, rates.rate, rates.developers_rate));
        let vat = amount.and_then(|a| portion(a, self.config.vat_rate));
        let ewt = amount.and_then(|a| portion(a, rates.ewt_rate.as_decimal()));
        let net_commission = match (amount, vat, ewt) {
            (Some(a), Some(v), Some(w)) => a.checked_add(v).and_then(|gross| gross.checked_sub(w)),
            _ => None,
        };

        TierResult {
            net_of_vat,
            amount,
            vat,
            ewt,
            net_commission,
        }
    }
}
