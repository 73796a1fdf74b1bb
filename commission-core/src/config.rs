//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! debounce_ms = 700
//!
//! [calculator]
//! net_of_vat_divisor = "1.02"
//! vat_rate = "0.12"
//!
//! [defaults]
//! rate = "4.0"
//! developers_rate = "5.0"
//! ewt_rate = "5"
//! calc_type = "nonvat with invoice"
//! ```

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::{CalculatorConfig, CalculatorConfigError, TierCalculator};
use crate::{CalculationTreatment, RateConfig, WithholdingRate};

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Calculator(#[from] CalculatorConfigError),

    #[error("default developers rate must be positive, got {0}")]
    InvalidDefaultDevelopersRate(Decimal),

    #[error("default rate must not be negative, got {0}")]
    NegativeDefaultRate(Decimal),
}

/// Rates given to every tier of a newly attached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultRates {
    pub rate: Decimal,
    pub developers_rate: Decimal,
    pub ewt_rate: WithholdingRate,
    pub calc_type: CalculationTreatment,
}

impl Default for DefaultRates {
    fn default() -> Self {
        let rates = RateConfig::default();
        Self {
            rate: rates.rate,
            developers_rate: rates.developers_rate,
            ewt_rate: rates.ewt_rate,
            calc_type: rates.calc_type,
        }
    }
}

impl DefaultRates {
    pub fn to_rate_config(&self) -> RateConfig {
        RateConfig {
            rate: self.rate,
            developers_rate: self.developers_rate,
            ewt_rate: self.ewt_rate,
            calc_type: self.calc_type,
        }
    }
}

/// Settings for the commission engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after a base-commission edit before the record is
    /// recomputed.
    pub debounce_ms: u64,
    pub calculator: CalculatorConfig,
    pub defaults: DefaultRates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 700,
            calculator: CalculatorConfig::default(),
            defaults: DefaultRates::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed TOML or invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the calculator constants and default rates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calculator.validate()?;
        if self.defaults.developers_rate <= Decimal::ZERO {
            return Err(ConfigError::InvalidDefaultDevelopersRate(
                self.defaults.developers_rate,
            ));
        }
        if self.defaults.rate < Decimal::ZERO {
            return Err(ConfigError::NegativeDefaultRate(self.defaults.rate));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn tier_calculator(&self) -> Result<TierCalculator, ConfigError> {
        Ok(TierCalculator::new(self.calculator)?)
    }
}
