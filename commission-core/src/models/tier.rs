use std::fmt;

use serde::{Deserialize, Serialize};

/// A commission beneficiary computed from the shared base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Agent,
    UnitManager,
    TeamLeader,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Agent, Self::UnitManager, Self::TeamLeader];

    /// Short column prefix used by the import and storage edges.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::UnitManager => "um",
            Self::TeamLeader => "tl",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::UnitManager => "Unit Manager",
            Self::TeamLeader => "Team Leader",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Agent => 0,
            Self::UnitManager => 1,
            Self::TeamLeader => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
