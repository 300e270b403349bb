// Model evaluation and matchup statistics
pub mod matchup_stats;
pub mod metrics;
