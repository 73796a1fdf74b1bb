//! CSV import and export for the commission engine.
//!
//! - [`CandidateLoader`] reads search results to attach to a group.
//! - [`EntrySheet`] reads a batch entry sheet and drives groups through the
//!   same mutators an interactive editor uses.
//! - [`ReportCsvWriter`] writes a [`commission_core::CommissionReport`].

pub mod candidates;
pub mod entries;
pub mod report_csv;

pub use candidates::{CandidateLoadError, CandidateLoader, CandidateRecord};
pub use entries::{EntryLoadError, EntryRow, EntrySheet};
pub use report_csv::{ReportCsvWriter, ReportWriteError};
