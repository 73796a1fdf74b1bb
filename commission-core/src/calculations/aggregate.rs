//! Field-wise totals across the records of a group.
//!
//! Unset fields count as zero for summation only; the records themselves
//! are read through shared references and never modified. Totals are not
//! cached anywhere, so every call reflects the records passed in.

use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::{RecordSnapshot, Tier, TierResult};

/// Summed fields of one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTotals {
    pub net_of_vat: Decimal,
    pub amount: Decimal,
    pub vat: Decimal,
    pub ewt: Decimal,
    pub net_commission: Decimal,
}

impl TierTotals {
    fn accumulate(
        &mut self,
        result: &TierResult,
    ) {
        let add = |total: &mut Decimal, field: Option<Decimal>| {
            *total = total.saturating_add(field.unwrap_or(Decimal::ZERO));
        };
        add(&mut self.net_of_vat, result.net_of_vat);
        add(&mut self.amount, result.amount);
        add(&mut self.vat, result.vat);
        add(&mut self.ewt, result.ewt);
        add(&mut self.net_commission, result.net_commission);
    }

    pub fn rounded(&self) -> Self {
        Self {
            net_of_vat: round_half_up(self.net_of_vat),
            amount: round_half_up(self.amount),
            vat: round_half_up(self.vat),
            ewt: round_half_up(self.ewt),
            net_commission: round_half_up(self.net_commission),
        }
    }
}

impl Add for TierTotals {
    type Output = TierTotals;

    fn add(
        self,
        rhs: TierTotals,
    ) -> TierTotals {
        TierTotals {
            net_of_vat: self.net_of_vat.saturating_add(rhs.net_of_vat),
            amount: self.amount.saturating_add(rhs.amount),
            vat: self.vat.saturating_add(rhs.vat),
            ewt: self.ewt.saturating_add(rhs.ewt),
            net_commission: self.net_commission.saturating_add(rhs.net_commission),
        }
    }
}

/// Report totals for a group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub record_count: usize,
    pub base_commission: Decimal,
    pub agent: TierTotals,
    pub unit_manager: TierTotals,
    pub team_leader: TierTotals,
}

impl GroupTotals {
    pub fn tier(
        &self,
        tier: Tier,
    ) -> &TierTotals {
        match tier {
            Tier::Agent => &self.agent,
            Tier::UnitManager => &self.unit_manager,
            Tier::TeamLeader => &self.team_leader,
        }
    }

    fn tier_mut(
        &mut self,
        tier: Tier,
    ) -> &mut TierTotals {
        match tier {
            Tier::Agent => &mut self.agent,
            Tier::UnitManager => &mut self.unit_manager,
            Tier::TeamLeader => &mut self.team_leader,
        }
    }

    /// Presentation copy rounded to two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            record_count: self.record_count,
            base_commission: round_half_up(self.base_commission),
            agent: self.agent.rounded(),
            unit_manager: self.unit_manager.rounded(),
            team_leader: self.team_leader.rounded(),
        }
    }
}

impl Add for GroupTotals {
    type Output = GroupTotals;

    fn add(
        self,
        rhs: GroupTotals,
    ) -> GroupTotals {
        GroupTotals {
            record_count: self.record_count + rhs.record_count,
            base_commission: self.base_commission.saturating_add(rhs.base_commission),
            agent: self.agent + rhs.agent,
            unit_manager: self.unit_manager + rhs.unit_manager,
            team_leader: self.team_leader + rhs.team_leader,
        }
    }
}

/// Sums tier fields across records.
pub struct GroupAggregator;

impl GroupAggregator {
    /// Computes totals over `records`.
    ///
    /// # Example
    ///
    /// ```
    /// use commission_core::RecordSnapshot;
    /// use commission_core::calculations::GroupAggregator;
    ///
    /// let totals = GroupAggregator::totals(std::iter::empty::<&RecordSnapshot>());
    /// assert_eq!(totals.record_count, 0);
    /// ```
    pub fn totals<'a, I>(records: I) -> GroupTotals
    where
        I: IntoIterator<Item = &'a RecordSnapshot>,
    {
        let mut totals = GroupTotals::default();
        for record in records {
            totals.record_count += 1;
            totals.base_commission = totals
                .base_commission
                .saturating_add(record.base_commission.unwrap_or(Decimal::ZERO));
            for tier in Tier::ALL {
                totals.tier_mut(tier).accumulate(&record.tier(tier).result);
            }
        }
        totals
    }
}
