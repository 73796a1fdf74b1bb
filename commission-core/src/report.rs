//! Report data handed to export collaborators.
//!
//! A report carries the snapshot of every record per group, the group's
//! totals and a grand total. Values are unrounded; call
//! [`CommissionReport::rounded`] for presentation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculations::{GroupAggregator, GroupTotals};
use crate::engine::Group;
use crate::{GroupKey, RecordSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub key: GroupKey,
    pub rows: Vec<RecordSnapshot>,
    pub totals: GroupTotals,
}

impl GroupReport {
    pub fn new(
        key: GroupKey,
        rows: Vec<RecordSnapshot>,
    ) -> Self {
        let totals = GroupAggregator::totals(&rows);
        Self { key, rows, totals }
    }

    pub fn from_group(group: &Group) -> Self {
        Self::new(group.key().clone(), group.snapshots())
    }

    pub fn rounded(&self) -> Self {
        Self {
            key: self.key.clone(),
            rows: self.rows.iter().map(RecordSnapshot::rounded).collect(),
            totals: self.totals.rounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReport {
    pub generated_on: NaiveDate,
    pub groups: Vec<GroupReport>,
    pub grand_totals: GroupTotals,
}

impl CommissionReport {
    /// Builds a report over `groups` in the order given.
    pub fn assemble<'a, I>(
        generated_on: NaiveDate,
        groups: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Group>,
    {
        let groups: Vec<GroupReport> = groups.into_iter().map(GroupReport::from_group).collect();
        let grand_totals = groups
            .iter()
            .fold(GroupTotals::default(), |sum, group| sum + group.totals);
        Self {
            generated_on,
            groups,
            grand_totals,
        }
    }

    pub fn record_count(&self) -> usize {
        self.grand_totals.record_count
    }

    /// Presentation copy. Grand totals are rounded from the unrounded sum,
    /// not summed from rounded group totals.
    pub fn rounded(&self) -> Self {
        Self {
            generated_on: self.generated_on,
            groups: self.groups.iter().map(GroupReport::rounded).collect(),
            grand_totals: self.grand_totals.rounded(),
        }
    }
}
