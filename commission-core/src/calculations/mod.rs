//! Commission calculations.
//!
//! [`TierCalculator`] derives one tier's fields from a base commission;
//! [`GroupAggregator`] sums those fields across the records of a group.

pub mod aggregate;
pub mod common;
pub mod tier;

pub use aggregate::{GroupAggregator, GroupTotals, TierTotals};
pub use tier::{CalculatorConfig, CalculatorConfigError, TierCalculator, TierOutcome};
