use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sale returned by the external search, ready to be attached to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub agent_name: String,
    pub developer_name: String,
    pub client_name: String,
    pub reservation_date: Option<NaiveDate>,
    pub base_amount_hint: Option<Decimal>,
}
