use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;

/// Derived monetary fields for one tier.
///
/// `None` means "not applicable" for the tier's treatment (or that the
/// inputs did not allow a value), never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResult {
    pub net_of_vat: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub vat: Option<Decimal>,
    pub ewt: Option<Decimal>,
    pub net_commission: Option<Decimal>,
}

impl TierResult {
    /// A result with every field unset.
    pub fn unset() -> Self {
        Self::default()
    }

    /// Whether the four payout fields (everything except net of VAT) are unset.
    pub fn payout_is_unset(&self) -> bool {
        self.amount.is_none()
            && self.vat.is_none()
            && self.ewt.is_none()
            && self.net_commission.is_none()
    }

    /// Presentation copy rounded to two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            net_of_vat: self.net_of_vat.map(round_half_up),
            amount: self.amount.map(round_half_up),
            vat: self.vat.map(round_half_up),
            ewt: self.ewt.map(round_half_up),
            net_commission: self.net_commission.map(round_half_up),
        }
    }
}
