use std::io::Read;

use chrono::NaiveDate;
use commission_core::SearchCandidate;
use commission_core::input::parse_amount;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading search candidates.
#[derive(Debug, Error)]
pub enum CandidateLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: invalid reservation date '{value}'")]
    InvalidDate { row: usize, value: String },
}

impl From<csv::Error> for CandidateLoadError {
    fn from(err: csv::Error) -> Self {
        CandidateLoadError::CsvParse(err.to_string())
    }
}

/// Date formats accepted in CSV cells.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses an optional date cell. Empty cells are `Ok(None)`; anything else
/// must match one of [`DATE_FORMATS`].
pub(crate) fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(Some)
        .ok_or(())
}

/// A single row of the candidate CSV file.
///
/// - `agent_name`, `developer_name`, `client_name`
/// - `reservation_date`: `YYYY-MM-DD` or `MM/DD/YYYY`, may be empty
/// - `base_amount_hint`: may be empty; thousands separators are accepted
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub agent_name: String,
    pub developer_name: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub reservation_date: String,
    #[serde(default)]
    pub base_amount_hint: String,
}

impl CandidateRecord {
    fn into_candidate(
        self,
        row: usize,
    ) -> Result<SearchCandidate, CandidateLoadError> {
        let reservation_date = parse_optional_date(&self.reservation_date).map_err(|_| {
            CandidateLoadError::InvalidDate {
                row,
                value: self.reservation_date.clone(),
            }
        })?;

        Ok(SearchCandidate {
            agent_name: self.agent_name.trim().to_string(),
            developer_name: self.developer_name.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
            reservation_date,
            base_amount_hint: parse_amount(&self.base_amount_hint),
        })
    }
}

/// Loader for search results exported as CSV.
pub struct CandidateLoader;

impl CandidateLoader {
    /// Parse candidates from a CSV reader.
    ///
    /// Row numbers in errors count data rows from 1.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SearchCandidate>, CandidateLoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut candidates = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: CandidateRecord = result?;
            candidates.push(record.into_candidate(index + 1)?);
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "agent_name,developer_name,client_name,reservation_date,base_amount_hint";

    #[test]
    fn test_parse_single_candidate() {
        let csv = format!(
            "{HEADER}\nMaria Santos,Northpoint Land,J. Reyes,2024-02-14,\"10,200.00\""
        );

        let candidates = CandidateLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            candidates,
            vec![SearchCandidate {
                agent_name: "Maria Santos".to_string(),
                developer_name: "Northpoint Land".to_string(),
                client_name: "J. Reyes".to_string(),
                reservation_date: NaiveDate::from_ymd_opt(2024, 2, 14),
                base_amount_hint: Some(dec!(10200.00)),
            }]
        );
    }

    #[test]
    fn test_parse_empty_optional_cells() {
        let csv = format!("{HEADER}\nMaria Santos,Northpoint Land,,,");

        let candidates = CandidateLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(candidates[0].client_name, "");
        assert_eq!(candidates[0].reservation_date, None);
        assert_eq!(candidates[0].base_amount_hint, None);
    }

    #[test]
    fn test_parse_us_date_format() {
        let csv = format!("{HEADER}\nA,B,C,02/14/2024,");

        let candidates = CandidateLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            candidates[0].reservation_date,
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
    }

    #[test]
    fn test_garbage_hint_is_unset() {
        let csv = format!("{HEADER}\nA,B,C,,about ten thousand");

        let candidates = CandidateLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(candidates[0].base_amount_hint, None);
    }

    #[test]
    fn test_invalid_date_reports_row() {
        let csv = format!("{HEADER}\nA,B,C,2024-02-14,\nA,B,C,Feb 14,");

        let err = CandidateLoader::parse(csv.as_bytes()).expect_err("Should fail for bad date");

        let CandidateLoadError::InvalidDate { row, value } = err else {
            panic!("Expected InvalidDate error, got: {:?}", err);
        };
        assert_eq!(row, 2);
        assert_eq!(value, "Feb 14");
    }

    #[test]
    fn test_missing_column() {
        let csv = "agent_name\nMaria Santos";

        let err = CandidateLoader::parse(csv.as_bytes()).expect_err("Should fail");

        let CandidateLoadError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }
}
