use std::fmt;

use serde::{Deserialize, Serialize};

/// How a tier's commission is derived from the base amount.
///
/// The serde and [`as_str`](Self::as_str) representations are the wire
/// strings used by the persistence and import edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationTreatment {
    #[default]
    #[serde(rename = "nonvat with invoice")]
    NonVatWithInvoice,
    #[serde(rename = "nonvat without invoice")]
    NonVatWithoutInvoice,
    #[serde(rename = "vat with invoice")]
    VatWithInvoice,
    #[serde(rename = "vat deduction")]
    VatDeduction,
}

impl CalculationTreatment {
    pub const ALL: [CalculationTreatment; 4] = [
        Self::NonVatWithInvoice,
        Self::NonVatWithoutInvoice,
        Self::VatWithInvoice,
        Self::VatDeduction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonVatWithInvoice => "nonvat with invoice",
            Self::NonVatWithoutInvoice => "nonvat without invoice",
            Self::VatWithInvoice => "vat with invoice",
            Self::VatDeduction => "vat deduction",
        }
    }

    /// Parses a wire string. Matching ignores case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|treatment| treatment.as_str().eq_ignore_ascii_case(s))
    }

    /// Whether the base amount is first reduced to its net-of-VAT value.
    pub fn uses_invoice(&self) -> bool {
        matches!(self, Self::NonVatWithInvoice | Self::VatWithInvoice)
    }

    /// Whether a calculation rule exists for this treatment.
    ///
    /// `VatDeduction` is selectable but has no formula; records keep the
    /// tier's previous values when it is selected.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::VatDeduction)
    }
}

impl fmt::Display for CalculationTreatment {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_every_wire_string() {
        for treatment in CalculationTreatment::ALL {
            assert_eq!(CalculationTreatment::parse(treatment.as_str()), Some(treatment));
        }
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(
            CalculationTreatment::parse("  VAT With Invoice "),
            Some(CalculationTreatment::VatWithInvoice)
        );
    }

    #[test]
    fn parse_rejects_unknown_treatment() {
        assert_eq!(CalculationTreatment::parse("zero rated"), None);
    }

    #[test]
    fn default_is_nonvat_with_invoice() {
        assert_eq!(
            CalculationTreatment::default(),
            CalculationTreatment::NonVatWithInvoice
        );
    }

    #[test]
    fn only_vat_deduction_is_unsupported() {
        let unsupported: Vec<_> = CalculationTreatment::ALL
            .into_iter()
            .filter(|t| !t.is_supported())
            .collect();

        assert_eq!(unsupported, vec![CalculationTreatment::VatDeduction]);
    }
}
