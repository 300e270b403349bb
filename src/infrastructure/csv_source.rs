//! Match history ingestion from delimited files.

use crate::domain::errors::PredictionError;
use crate::domain::types::MatchRecord;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const REQUIRED_COLUMNS: [&str; 4] = ["date", "opponent_archetype", "event_type", "winrate"];
pub const OPTIONAL_COLUMNS: [&str; 2] = ["deck_version", "meta_shift"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open match file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Invalid(#[from] PredictionError),
}

#[derive(Debug, Deserialize)]
struct RawMatchRow {
    date: String,
    opponent_archetype: String,
    event_type: String,
    #[serde(default)]
    deck_version: Option<String>,
    #[serde(default)]
    meta_shift: Option<String>,
    winrate: String,
}

/// Parses a calendar date, accepting a few common spellings and ignoring a
/// time-of-day component.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_winrate(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().trim_end_matches('%').trim().parse().ok()?;
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_row(raw: RawMatchRow, index: usize) -> Result<MatchRecord, PredictionError> {
    // Header is line 1
    let line = index + 2;
    let date = parse_match_date(&raw.date).ok_or_else(|| PredictionError::Parse {
        index,
        reason: format!("line {}: invalid date '{}'", line, raw.date),
    })?;
    let winrate = parse_winrate(&raw.winrate).ok_or_else(|| PredictionError::Parse {
        index,
        reason: format!(
            "line {}: winrate '{}' is not a percentage in [0, 100]",
            line, raw.winrate
        ),
    })?;
    for (name, value) in [
        ("opponent_archetype", &raw.opponent_archetype),
        ("event_type", &raw.event_type),
    ] {
        if value.trim().is_empty() {
            return Err(PredictionError::Parse {
                index,
                reason: format!("line {}: empty {}", line, name),
            });
        }
    }

    Ok(MatchRecord {
        date,
        opponent_archetype: raw.opponent_archetype,
        event_type: raw.event_type,
        deck_version: non_empty(raw.deck_version),
        meta_shift: non_empty(raw.meta_shift),
        winrate,
    })
}

/// Ragged and undecodable rows are reported like any other bad row; I/O and
/// encoding failures stay CSV errors.
fn row_error(err: csv::Error, index: usize) -> IngestError {
    let line = index + 2;
    let reason = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!(
            "line {}: expected {} fields, found {}",
            line, expected_len, len
        ),
        csv::ErrorKind::Deserialize { err: de, .. } => format!("line {}: {}", line, de),
        _ => return IngestError::Csv(err),
    };
    PredictionError::Parse { index, reason }.into()
}

/// Reads match records from CSV text with a header row.
///
/// Columns other than the required and optional ones are ignored.
pub fn read_matches<R: io::Read>(reader: R) -> Result<Vec<MatchRecord>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(PredictionError::schema(format!("missing required column '{}'", column)).into());
        }
    }
    for (i, header) in headers.iter().enumerate() {
        let known = REQUIRED_COLUMNS.contains(&header) || OPTIONAL_COLUMNS.contains(&header);
        if known && headers.iter().take(i).any(|h| h == header) {
            return Err(PredictionError::schema(format!("duplicate column '{}'", header)).into());
        }
        if !known {
            debug!("Ignoring unexpected column '{}'", header);
        }
    }

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<RawMatchRow>().enumerate() {
        let raw = result.map_err(|e| row_error(e, index))?;
        records.push(parse_row(raw, index)?);
    }
    Ok(records)
}

/// Loads match records from a CSV file.
pub fn load_matches(path: &Path) -> Result<Vec<MatchRecord>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_matches(BufReader::new(file))?;
    info!("Loaded {} match records from {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_required_and_optional_columns() {
        let data = "\
date,opponent_archetype,event_type,winrate,deck_version,notes
2024-03-01,Control,League,55.5,v1,first
2024-03-02,Aggro,Challenge,61%,,
";
        let records = read_matches(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].deck_version.as_deref(), Some("v1"));
        assert_eq!(records[0].meta_shift, None);
        assert_eq!(records[1].deck_version, None);
        assert_eq!(records[1].winrate, 61.0);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_missing_required_column() {
        let data = "date,opponent_archetype,winrate\n2024-03-01,Control,50\n";
        match read_matches(data.as_bytes()) {
            Err(IngestError::Invalid(PredictionError::Schema { reason })) => {
                assert!(reason.contains("event_type"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_identifies_record() {
        let data = "\
date,opponent_archetype,event_type,winrate
2024-03-01,Control,League,50
not-a-date,Aggro,League,50
";
        match read_matches(data.as_bytes()) {
            Err(IngestError::Invalid(PredictionError::Parse { index, reason })) => {
                assert_eq!(index, 1);
                assert!(reason.contains("line 3"));
                assert!(reason.contains("not-a-date"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_numeric_and_out_of_range_winrate() {
        for bad in ["abc", "101", "-1", "NaN"] {
            let data = format!(
                "date,opponent_archetype,event_type,winrate\n2024-03-01,Control,League,{}\n",
                bad
            );
            assert!(
                matches!(
                    read_matches(data.as_bytes()),
                    Err(IngestError::Invalid(PredictionError::Parse { .. }))
                ),
                "winrate {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_ragged_row_identifies_record() {
        let data = "\
date,opponent_archetype,event_type,winrate
2024-03-01,Control,League,50
2024-03-02,Aggro,League
";
        match read_matches(data.as_bytes()) {
            Err(IngestError::Invalid(PredictionError::Parse { index, reason })) => {
                assert_eq!(index, 1);
                assert!(reason.contains("line 3"), "{}", reason);
                assert!(reason.contains("expected 4 fields, found 3"), "{}", reason);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_known_column() {
        let data = "date,opponent_archetype,event_type,winrate,winrate\n";
        assert!(matches!(
            read_matches(data.as_bytes()),
            Err(IngestError::Invalid(PredictionError::Schema { .. }))
        ));
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 9);
        assert_eq!(parse_match_date("2024-07-09"), expected);
        assert_eq!(parse_match_date("2024/07/09"), expected);
        assert_eq!(parse_match_date("07/09/2024"), expected);
        assert_eq!(parse_match_date("2024-07-09 18:30:00"), expected);
        assert_eq!(parse_match_date("2024-02-30"), None);
    }
}
