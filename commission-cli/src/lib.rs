//! Batch driver for the commission engine.
//!
//! Reads an entry sheet, feeds every row through the same [`Group`] mutators
//! an interactive client would use, waits for the debounced recomputes to
//! finish, then writes the report and optionally stores the snapshots.
//!
//! [`Group`]: commission_core::Group

pub mod app;
