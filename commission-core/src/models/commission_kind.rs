use serde::{Deserialize, Serialize};

/// What a commission line pays out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommissionKind {
    #[default]
    #[serde(rename = "COMM")]
    Comm,
    #[serde(rename = "INCENTIVES")]
    Incentives,
    #[serde(rename = "COMM & INCENTIVES")]
    CommAndIncentives,
}

impl CommissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comm => "COMM",
            Self::Incentives => "INCENTIVES",
            Self::CommAndIncentives => "COMM & INCENTIVES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COMM" => Some(Self::Comm),
            "INCENTIVES" => Some(Self::Incentives),
            "COMM & INCENTIVES" | "COMM_AND_INCENTIVES" => Some(Self::CommAndIncentives),
            _ => None,
        }
    }
}
