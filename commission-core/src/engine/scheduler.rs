//! Recompute timing.
//!
//! Each `(record, scope)` key moves through
//! `Idle → PendingDebounce → Computing → Idle`. Base-commission edits are
//! debounced on the whole-record scope; rate edits go straight to
//! `Computing` on their tier scope. A key holds at most one pending
//! deadline: a new debounced edit replaces it.
//!
//! Time is passed in by the caller so the state machine itself never
//! sleeps or reads a clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{RecordId, Tier};

/// What a recompute covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecomputeScope {
    Record,
    Tier(Tier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecomputeKey {
    pub record: RecordId,
    pub scope: RecomputeScope,
}

impl RecomputeKey {
    pub fn record(record: RecordId) -> Self {
        Self {
            record,
            scope: RecomputeScope::Record,
        }
    }

    pub fn tier(
        record: RecordId,
        tier: Tier,
    ) -> Self {
        Self {
            record,
            scope: RecomputeScope::Tier(tier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    PendingDebounce { deadline: Instant },
    Computing,
}

/// Per-key recompute state machine.
#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    delay: Duration,
    states: HashMap<RecomputeKey, SchedulerState>,
}

impl RecomputeScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            states: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(
        &self,
        key: &RecomputeKey,
    ) -> SchedulerState {
        self.states
            .get(key)
            .copied()
            .unwrap_or(SchedulerState::Idle)
    }

    /// Starts (or restarts) the debounce timer for `key`.
    ///
    /// Returns `true` when a pending deadline was replaced.
    pub fn schedule_debounced(
        &mut self,
        key: RecomputeKey,
        now: Instant,
    ) -> bool {
        let deadline = now + self.delay;
        let previous = self
            .states
            .insert(key, SchedulerState::PendingDebounce { deadline });
        let replaced = matches!(previous, Some(SchedulerState::PendingDebounce { .. }));
        debug!(record = key.record, replaced, "debounced recompute scheduled");
        replaced
    }

    /// Runs `compute` synchronously with `key` in the `Computing` state.
    ///
    /// A deadline pending on the same key is superseded by the immediate
    /// run.
    pub fn run_immediate<R>(
        &mut self,
        key: RecomputeKey,
        compute: impl FnOnce() -> R,
    ) -> R {
        self.states.insert(key, SchedulerState::Computing);
        let result = compute();
        self.complete(key);
        result
    }

    /// Moves every key whose deadline has passed into `Computing` and
    /// returns them in deadline order.
    pub fn take_due(
        &mut self,
        now: Instant,
    ) -> Vec<RecomputeKey> {
        let mut due: Vec<(Instant, RecomputeKey)> = self
            .states
            .iter()
            .filter_map(|(key, state)| match state {
                SchedulerState::PendingDebounce { deadline } if *deadline <= now => {
                    Some((*deadline, *key))
                }
                _ => None,
            })
            .collect();
        due.sort_by_key(|(deadline, key)| (*deadline, key.record));

        for (_, key) in &due {
            self.states.insert(*key, SchedulerState::Computing);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Returns `key` to `Idle`.
    pub fn complete(
        &mut self,
        key: RecomputeKey,
    ) {
        self.states.remove(&key);
    }

    /// Drops every state held for `record`. Returns `true` if anything was
    /// pending.
    pub fn cancel(
        &mut self,
        record: RecordId,
    ) -> bool {
        let before = self.states.len();
        self.states.retain(|key, _| key.record != record);
        before != self.states.len()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.states
            .values()
            .filter_map(|state| match state {
                SchedulerState::PendingDebounce { deadline } => Some(*deadline),
                _ => None,
            })
            .min()
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|state| matches!(state, SchedulerState::PendingDebounce { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DELAY: Duration = Duration::from_millis(700);

    #[test]
    fn unknown_key_is_idle() {
        let scheduler = RecomputeScheduler::new(DELAY);

        assert_eq!(
            scheduler.state(&RecomputeKey::record(1)),
            SchedulerState::Idle
        );
    }

    #[test]
    fn debounce_sets_deadline_after_delay() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();

        let replaced = scheduler.schedule_debounced(RecomputeKey::record(1), t0);

        assert!(!replaced);
        assert_eq!(
            scheduler.state(&RecomputeKey::record(1)),
            SchedulerState::PendingDebounce { deadline: t0 + DELAY }
        );
        assert_eq!(scheduler.next_deadline(), Some(t0 + DELAY));
    }

    #[test]
    fn repeated_debounce_keeps_one_pending_entry() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        let key = RecomputeKey::record(7);

        scheduler.schedule_debounced(key, t0);
        let replaced = scheduler.schedule_debounced(key, t0 + Duration::from_millis(300));

        assert!(replaced);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.next_deadline(),
            Some(t0 + Duration::from_millis(300) + DELAY)
        );
    }

    #[test]
    fn take_due_ignores_future_deadlines() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        scheduler.schedule_debounced(RecomputeKey::record(1), t0);

        assert!(scheduler.take_due(t0 + Duration::from_millis(699)).is_empty());
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn take_due_moves_keys_to_computing_in_deadline_order() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        scheduler.schedule_debounced(RecomputeKey::record(2), t0 + Duration::from_millis(10));
        scheduler.schedule_debounced(RecomputeKey::record(1), t0);

        let due = scheduler.take_due(t0 + Duration::from_secs(1));

        assert_eq!(due, vec![RecomputeKey::record(1), RecomputeKey::record(2)]);
        assert_eq!(
            scheduler.state(&RecomputeKey::record(1)),
            SchedulerState::Computing
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn complete_returns_key_to_idle() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        let key = RecomputeKey::record(1);
        scheduler.schedule_debounced(key, t0);
        scheduler.take_due(t0 + DELAY);

        scheduler.complete(key);

        assert_eq!(scheduler.state(&key), SchedulerState::Idle);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn run_immediate_returns_result_and_ends_idle() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let key = RecomputeKey::tier(3, Tier::TeamLeader);

        let result = scheduler.run_immediate(key, || 42);

        assert_eq!(result, 42);
        assert_eq!(scheduler.state(&key), SchedulerState::Idle);
    }

    #[test]
    fn immediate_tier_run_leaves_record_debounce_pending() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        scheduler.schedule_debounced(RecomputeKey::record(1), t0);

        scheduler.run_immediate(RecomputeKey::tier(1, Tier::Agent), || ());

        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn cancel_drops_all_scopes_of_a_record() {
        let mut scheduler = RecomputeScheduler::new(DELAY);
        let t0 = Instant::now();
        scheduler.schedule_debounced(RecomputeKey::record(1), t0);
        scheduler.schedule_debounced(RecomputeKey::record(2), t0);

        assert!(scheduler.cancel(1));
        assert!(!scheduler.cancel(1));
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.state(&RecomputeKey::record(2)),
            SchedulerState::PendingDebounce { deadline: t0 + DELAY }
        );
    }
}
