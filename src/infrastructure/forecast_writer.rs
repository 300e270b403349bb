//! CSV export of batch forecasts.
//!
//! Layout: `date, Predicted Winrate, Winrate_vs_<Archetype>...`, one row per
//! forecast date, archetype names with spaces replaced by underscores.

use crate::application::ml::forecast::ForecastRow;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

pub const OVERALL_COLUMN: &str = "Predicted Winrate";
pub const MATCHUP_PREFIX: &str = "Winrate_vs_";

pub fn matchup_column(archetype: &str) -> String {
    format!("{}{}", MATCHUP_PREFIX, archetype.trim().replace(' ', "_"))
}

/// Writes `rows` as CSV. Every row must list the same archetypes in the same
/// order, which holds for rows produced by one `forecast` call.
pub fn write_forecast<W: io::Write>(rows: &[ForecastRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let archetypes: Vec<&str> = rows
        .first()
        .map(|r| r.matchups.iter().map(|(a, _)| a.as_str()).collect())
        .unwrap_or_default();

    let mut header = vec!["date".to_string(), OVERALL_COLUMN.to_string()];
    header.extend(archetypes.iter().map(|a| matchup_column(a)));
    wtr.write_record(&header)?;

    for row in rows {
        let same_layout = row.matchups.len() == archetypes.len()
            && row
                .matchups
                .iter()
                .zip(&archetypes)
                .all(|((a, _), expected)| a == expected);
        if !same_layout {
            bail!("Forecast row for {} has a different matchup layout", row.date);
        }

        let mut record = vec![
            row.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", row.predicted_winrate),
        ];
        record.extend(row.matchups.iter().map(|(_, wr)| format!("{:.4}", wr)));
        wtr.write_record(&record)?;
    }

    wtr.flush().context("Failed to flush forecast CSV")?;
    Ok(())
}

/// Writes `rows` to a CSV file at `path`.
pub fn save_forecast(rows: &[ForecastRow], path: &Path) -> Result<()> {
    let file = File::create(path).context(format!("Failed to create forecast file {:?}", path))?;
    write_forecast(rows, file)?;
    info!("Wrote {} forecast rows to {:?}", rows.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(d: u32, values: &[(&str, f64)]) -> ForecastRow {
        let matchups: Vec<(String, f64)> =
            values.iter().map(|(a, v)| (a.to_string(), *v)).collect();
        let mean = matchups.iter().map(|(_, v)| v).sum::<f64>() / matchups.len() as f64;
        ForecastRow {
            date: NaiveDate::from_ymd_opt(2025, 1, d).unwrap(),
            predicted_winrate: mean,
            matchups,
        }
    }

    #[test]
    fn test_layout() {
        let rows = vec![
            row(1, &[("Mono Red", 40.0), ("Control", 60.0)]),
            row(2, &[("Mono Red", 41.0), ("Control", 61.0)]),
        ];
        let mut out = Vec::new();
        write_forecast(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,Predicted Winrate,Winrate_vs_Mono_Red,Winrate_vs_Control"
        );
        assert_eq!(lines[1], "2025-01-01,50.0000,40.0000,60.0000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_mismatched_rows_rejected() {
        let rows = vec![
            row(1, &[("Aggro", 40.0)]),
            row(2, &[("Combo", 41.0)]),
        ];
        assert!(write_forecast(&rows, Vec::new()).is_err());
    }
}
