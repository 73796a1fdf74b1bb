//! Batch entry sheets.
//!
//! An entry sheet has one row per sale. Rows are grouped by
//! `(developer_name, invoice_no)` in order of first appearance, and each row
//! is applied to its group through the regular record mutators: descriptive
//! fields first, then rate edits (recomputed immediately), then the base
//! commission (debounced). The caller settles the groups afterwards.
//!
//! Per-tier columns are optional. An empty cell keeps the engine default.
//!
//! | column                          | example               |
//! |---------------------------------|-----------------------|
//! | `{tier}_calc_type`              | `vat with invoice`    |
//! | `{tier}_rate`                   | `4.0`                 |
//! | `{tier}_developers_rate`        | `5.0`                 |
//! | `{tier}_ewt_rate`               | `10`                  |
//!
//! `{tier}` is `agent`, `um` or `tl`.

use std::io::Read;
use std::time::Instant;

use chrono::NaiveDate;
use commission_core::input::parse_rate;
use commission_core::{
    CalculationTreatment, CommissionKind, ConfigError, DescriptiveField, EngineConfig, Group,
    GroupError, GroupKey, RateField, RecordId, SearchCandidate, Tier, WithholdingRate,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::candidates::parse_optional_date;

/// Errors that can occur when loading an entry sheet.
#[derive(Debug, Error)]
pub enum EntryLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: invalid reservation date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: unknown commission kind '{value}'")]
    InvalidCommissionKind { row: usize, value: String },

    #[error("row {row}: unknown calculation type '{value}' for {tier}")]
    InvalidCalcType {
        row: usize,
        tier: Tier,
        value: String,
    },

    #[error("row {row}: EWT rate must be 5 or 10, got '{value}' for {tier}")]
    InvalidEwtRate {
        row: usize,
        tier: Tier,
        value: String,
    },

    #[error("row {row}: developer name and invoice number are required")]
    MissingGroupKey { row: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Group(#[from] GroupError),
}

impl From<csv::Error> for EntryLoadError {
    fn from(err: csv::Error) -> Self {
        EntryLoadError::CsvParse(err.to_string())
    }
}

/// A single row of an entry sheet. Cells are kept as text; they are parsed
/// when the row is applied to a group.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntryRow {
    pub developer_name: String,
    pub invoice_no: String,
    pub agent_name: String,
    pub client_name: String,
    pub reservation_date: String,
    pub base_commission: String,
    pub commission_kind: String,
    pub status: String,
    pub bdo_account: String,
    pub remarks: String,

    pub agent_calc_type: String,
    pub agent_rate: String,
    pub agent_developers_rate: String,
    pub agent_ewt_rate: String,

    pub um_calc_type: String,
    pub um_rate: String,
    pub um_developers_rate: String,
    pub um_ewt_rate: String,

    pub tl_calc_type: String,
    pub tl_rate: String,
    pub tl_developers_rate: String,
    pub tl_ewt_rate: String,
}

/// The rate cells of one tier.
struct TierCells<'a> {
    calc_type: &'a str,
    rate: &'a str,
    developers_rate: &'a str,
    ewt_rate: &'a str,
}

impl EntryRow {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.developer_name.trim(), self.invoice_no.trim())
    }

    fn tier_cells(
        &self,
        tier: Tier,
    ) -> TierCells<'_> {
        match tier {
            Tier::Agent => TierCells {
                calc_type: &self.agent_calc_type,
                rate: &self.agent_rate,
                developers_rate: &self.agent_developers_rate,
                ewt_rate: &self.agent_ewt_rate,
            },
            Tier::UnitManager => TierCells {
                calc_type: &self.um_calc_type,
                rate: &self.um_rate,
                developers_rate: &self.um_developers_rate,
                ewt_rate: &self.um_ewt_rate,
            },
            Tier::TeamLeader => TierCells {
                calc_type: &self.tl_calc_type,
                rate: &self.tl_rate,
                developers_rate: &self.tl_developers_rate,
                ewt_rate: &self.tl_ewt_rate,
            },
        }
    }

    fn candidate(
        &self,
        row: usize,
    ) -> Result<SearchCandidate, EntryLoadError> {
        let reservation_date = parse_optional_date(&self.reservation_date).map_err(|_| {
            EntryLoadError::InvalidDate {
                row,
                value: self.reservation_date.clone(),
            }
        })?;
        Ok(SearchCandidate {
            agent_name: self.agent_name.trim().to_string(),
            developer_name: self.developer_name.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
            reservation_date,
            base_amount_hint: None,
        })
    }

    /// Rate edits for the non-empty tier cells, validated up front so a bad
    /// row leaves its group untouched.
    fn rate_edits(
        &self,
        row: usize,
    ) -> Result<Vec<(Tier, RateField)>, EntryLoadError> {
        let mut edits = Vec::new();
        for tier in Tier::ALL {
            let cells = self.tier_cells(tier);
            if !cells.calc_type.trim().is_empty() {
                let calc_type = CalculationTreatment::parse(cells.calc_type).ok_or_else(|| {
                    EntryLoadError::InvalidCalcType {
                        row,
                        tier,
                        value: cells.calc_type.to_string(),
                    }
                })?;
                edits.push((tier, RateField::CalcType(calc_type)));
            }
            if !cells.rate.trim().is_empty() {
                edits.push((tier, RateField::Rate(parse_rate(cells.rate))));
            }
            if !cells.developers_rate.trim().is_empty() {
                edits.push((
                    tier,
                    RateField::DevelopersRate(parse_rate(cells.developers_rate)),
                ));
            }
            if !cells.ewt_rate.trim().is_empty() {
                let ewt_rate = WithholdingRate::parse(cells.ewt_rate).ok_or_else(|| {
                    EntryLoadError::InvalidEwtRate {
                        row,
                        tier,
                        value: cells.ewt_rate.to_string(),
                    }
                })?;
                edits.push((tier, RateField::EwtRate(ewt_rate)));
            }
        }
        Ok(edits)
    }

    fn commission_kind(
        &self,
        row: usize,
    ) -> Result<Option<CommissionKind>, EntryLoadError> {
        if self.commission_kind.trim().is_empty() {
            return Ok(None);
        }
        CommissionKind::parse(&self.commission_kind)
            .map(Some)
            .ok_or_else(|| EntryLoadError::InvalidCommissionKind {
                row,
                value: self.commission_kind.clone(),
            })
    }

    /// Attaches this row to `group` and applies its cells. Returns the new
    /// record's id.
    ///
    /// The base commission is stored with `now` as the start of its debounce
    /// window; tier results reflect it only after the group is polled or
    /// settled.
    pub fn apply(
        &self,
        group: &mut Group,
        row: usize,
        record_date: NaiveDate,
        now: Instant,
    ) -> Result<RecordId, EntryLoadError> {
        let candidate = self.candidate(row)?;
        let kind = self.commission_kind(row)?;
        let rate_edits = self.rate_edits(row)?;

        let id = group.attach(candidate, record_date);
        if let Some(kind) = kind {
            group.update_descriptive(id, DescriptiveField::Kind(kind))?;
        }
        for field in [
            DescriptiveField::Status(self.status.trim().to_string()),
            DescriptiveField::BdoAccount(self.bdo_account.trim().to_string()),
            DescriptiveField::Remarks(self.remarks.trim().to_string()),
        ] {
            group.update_descriptive(id, field)?;
        }
        for (tier, field) in rate_edits {
            group.update_rate_config(id, tier, field)?;
        }
        group.update_base_commission(id, &self.base_commission, now)?;

        debug!(row, group = %group.key(), record = id, "entry applied");
        Ok(id)
    }
}

/// Loader for batch entry sheets.
pub struct EntrySheet;

impl EntrySheet {
    /// Parse entry rows from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<EntryRow>, EntryLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let mut rows = Vec::new();

        for result in csv_reader.deserialize() {
            let row: EntryRow = result?;
            rows.push(row);
        }

        Ok(rows)
    }

    /// Builds one group per `(developer_name, invoice_no)`, in order of first
    /// appearance, and applies every row to its group.
    ///
    /// Row numbers in errors count data rows from 1. Base commissions are
    /// pending when this returns; poll or settle the groups before reading
    /// totals.
    pub fn build_groups(
        rows: &[EntryRow],
        config: &EngineConfig,
        record_date: NaiveDate,
        now: Instant,
    ) -> Result<Vec<Group>, EntryLoadError> {
        let mut groups: Vec<Group> = Vec::new();

        for (index, entry) in rows.iter().enumerate() {
            let row = index + 1;
            let key = entry.group_key();
            if key.developer_name.is_empty() || key.invoice_no.is_empty() {
                return Err(EntryLoadError::MissingGroupKey { row });
            }

            let position = match groups.iter().position(|group| group.key() == &key) {
                Some(position) => position,
                None => {
                    groups.push(Group::new(key, config)?);
                    groups.len() - 1
                }
            };
            entry.apply(&mut groups[position], row, record_date, now)?;
        }

        Ok(groups)
    }
}
