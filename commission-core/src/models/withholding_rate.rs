use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expanded withholding tax rate applied to a tier's gross amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithholdingRate {
    #[default]
    #[serde(rename = "5")]
    FivePercent,
    #[serde(rename = "10")]
    TenPercent,
}

impl WithholdingRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FivePercent => "5",
            Self::TenPercent => "10",
        }
    }

    /// Accepts `"5"`/`"10"`, optionally followed by `%`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_end_matches('%').trim() {
            "5" => Some(Self::FivePercent),
            "10" => Some(Self::TenPercent),
            _ => None,
        }
    }

    /// The rate as a fraction (`0.05` or `0.10`).
    pub fn as_decimal(&self) -> Decimal {
        match self {
            Self::FivePercent => Decimal::new(5, 2),
            Self::TenPercent => Decimal::new(10, 2),
        }
    }
}

impl fmt::Display for WithholdingRate {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}%", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn as_decimal_returns_fraction() {
        assert_eq!(WithholdingRate::FivePercent.as_decimal(), dec!(0.05));
        assert_eq!(WithholdingRate::TenPercent.as_decimal(), dec!(0.10));
    }

    #[test]
    fn parse_accepts_bare_and_percent_forms() {
        assert_eq!(WithholdingRate::parse("5"), Some(WithholdingRate::FivePercent));
        assert_eq!(WithholdingRate::parse(" 10% "), Some(WithholdingRate::TenPercent));
        assert_eq!(WithholdingRate::parse("12"), None);
    }
}
