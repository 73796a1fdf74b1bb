//! Record ownership and recompute timing.

pub mod group;
pub mod record;
pub mod scheduler;

pub use group::{Group, GroupError};
pub use record::{CommissionRecord, DescriptiveField, Recompute};
pub use scheduler::{RecomputeKey, RecomputeScheduler, RecomputeScope, SchedulerState};
