//! Descriptive winrate statistics over the raw match corpus.

use crate::domain::types::MatchRecord;
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::{Data, Distribution};
use std::collections::BTreeMap;

/// Observed winrate against one opponent archetype.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupStats {
    pub opponent_archetype: String,
    pub matches: usize,
    pub mean_winrate: f64,
    /// Sample standard deviation; `None` with fewer than two matches.
    pub std_dev: Option<f64>,
}

/// Matchups sorted from best to worst mean winrate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupSummary {
    pub matchups: Vec<MatchupStats>,
}

impl MatchupSummary {
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.opponent_archetype.as_str())
                .or_default()
                .push(record.winrate);
        }

        let mut matchups: Vec<MatchupStats> = grouped
            .into_iter()
            .filter_map(|(archetype, winrates)| {
                let matches = winrates.len();
                let data = Data::new(winrates);
                let mean_winrate = data.mean()?;
                let std_dev = if matches >= 2 { data.std_dev() } else { None };
                Some(MatchupStats {
                    opponent_archetype: archetype.to_string(),
                    matches,
                    mean_winrate,
                    std_dev,
                })
            })
            .collect();

        matchups.sort_by(|a, b| {
            b.mean_winrate
                .total_cmp(&a.mean_winrate)
                .then_with(|| a.opponent_archetype.cmp(&b.opponent_archetype))
        });
        Self { matchups }
    }

    /// Best `n` matchups.
    pub fn top(&self, n: usize) -> &[MatchupStats] {
        &self.matchups[..n.min(self.matchups.len())]
    }

    /// Worst `n` matchups, still ordered best to worst.
    pub fn bottom(&self, n: usize) -> &[MatchupStats] {
        let start = self.matchups.len().saturating_sub(n);
        &self.matchups[start..]
    }

    pub fn is_empty(&self) -> bool {
        self.matchups.is_empty()
    }
}

/// Mean observed winrate per calendar date, in date order.
pub fn winrate_over_time(records: &[MatchRecord]) -> Vec<(NaiveDate, f64)> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = by_date.entry(record.date).or_insert((0.0, 0));
        entry.0 += record.winrate;
        entry.1 += 1;
    }
    by_date
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}
