//! CSV export of a [`CommissionReport`].
//!
//! One row per record in group order, a `TOTAL` row after each group and a
//! `GRAND TOTAL` row at the end. Monetary values are rounded to two places;
//! unset fields are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use commission_core::{CommissionReport, GroupTotals, RecordSnapshot, Tier, TierTotals};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const RECORD_COLUMNS: [&str; 9] = [
    "developer_name",
    "invoice_no",
    "no",
    "date",
    "agent_name",
    "client_name",
    "reservation_date",
    "commission_kind",
    "base_commission",
];

const TIER_COLUMNS: [&str; 9] = [
    "calc_type",
    "rate",
    "developers_rate",
    "ewt_rate",
    "net_of_vat",
    "amount",
    "vat",
    "ewt",
    "net_commission",
];

const TRAILING_COLUMNS: [&str; 3] = ["status", "bdo_account", "remarks"];

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

fn optional_money(value: Option<Decimal>) -> String {
    value.map(money).unwrap_or_default()
}

pub struct ReportCsvWriter;

impl ReportCsvWriter {
    pub fn header() -> Vec<String> {
        let mut header: Vec<String> = RECORD_COLUMNS.iter().map(|c| c.to_string()).collect();
        for tier in Tier::ALL {
            header.extend(
                TIER_COLUMNS
                    .iter()
                    .map(|column| format!("{}_{}", tier.as_str(), column)),
            );
        }
        header.extend(TRAILING_COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    fn record_row(
        row: &RecordSnapshot,
        invoice_no: &str,
    ) -> Vec<String> {
        let mut cells = vec![
            row.developer_name.clone(),
            invoice_no.to_string(),
            row.sequence_no.to_string(),
            row.date.to_string(),
            row.agent_name.clone(),
            row.client_name.clone(),
            row.reservation_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            row.commission_kind.as_str().to_string(),
            optional_money(row.base_commission),
        ];
        for tier in Tier::ALL {
            let snapshot = row.tier(tier);
            cells.extend([
                snapshot.config.calc_type.as_str().to_string(),
                snapshot.config.rate.to_string(),
                snapshot.config.developers_rate.to_string(),
                snapshot.config.ewt_rate.as_str().to_string(),
                optional_money(snapshot.result.net_of_vat),
                optional_money(snapshot.result.amount),
                optional_money(snapshot.result.vat),
                optional_money(snapshot.result.ewt),
                optional_money(snapshot.result.net_commission),
            ]);
        }
        cells.extend([
            row.status.clone(),
            row.bdo_account.clone(),
            row.remarks.clone(),
        ]);
        cells
    }

    fn totals_row(
        developer_name: &str,
        invoice_no: &str,
        label: &str,
        totals: &GroupTotals,
    ) -> Vec<String> {
        let mut cells = vec![
            developer_name.to_string(),
            invoice_no.to_string(),
            label.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            money(totals.base_commission),
        ];
        for tier in Tier::ALL {
            let TierTotals {
                net_of_vat,
                amount,
                vat,
                ewt,
                net_commission,
            } = *totals.tier(tier);
            cells.extend([String::new(), String::new(), String::new(), String::new()]);
            cells.extend([net_of_vat, amount, vat, ewt, net_commission].map(money));
        }
        cells.extend([String::new(), String::new(), String::new()]);
        cells
    }

    /// Writes `report` as CSV.
    pub fn write<W: Write>(
        writer: W,
        report: &CommissionReport,
    ) -> Result<(), ReportWriteError> {
        let report = report.rounded();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(Self::header())?;
        for group in &report.groups {
            for row in &group.rows {
                csv_writer.write_record(Self::record_row(row, &group.key.invoice_no))?;
            }
            csv_writer.write_record(Self::totals_row(
                &group.key.developer_name,
                &group.key.invoice_no,
                "TOTAL",
                &group.totals,
            ))?;
        }
        csv_writer.write_record(Self::totals_row("", "", "GRAND TOTAL", &report.grand_totals))?;
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes `report` to a file at `path`, replacing any existing file.
    pub fn write_to_path(
        path: &Path,
        report: &CommissionReport,
    ) -> Result<(), ReportWriteError> {
        let file = File::create(path)?;
        Self::write(file, report)?;
        info!(path = %path.display(), records = report.record_count(), "report written");
        Ok(())
    }
}
