use super::winrate_predictor::{FittedModel, WinratePredictor};
use crate::config::PipelineConfig;
use crate::domain::errors::PredictionResult;
use crate::domain::ml::feature_encoder::FeatureEncoder;
use crate::domain::performance::metrics::RegressionMetrics;
use crate::domain::types::MatchRecord;
use serde::Serialize;
use tracing::info;

/// What a training run did, for logging and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub n_records: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub columns: Vec<String>,
    pub metrics: RegressionMetrics,
}

/// Result of a full encode → split → fit → evaluate cycle.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: FittedModel,
    pub report: TrainingReport,
}

/// Runs one training cycle over `records`.
///
/// Nothing is returned unless every stage succeeds.
pub fn run_training(
    records: &[MatchRecord],
    config: &PipelineConfig,
) -> PredictionResult<TrainingOutcome> {
    info!("Encoding {} match records", records.len());
    let (vocabulary, x) =
        FeatureEncoder::fit_transform(records, &config.encoding.categorical_fields)?;
    let y: Vec<f64> = records.iter().map(|r| r.winrate).collect();
    let columns = vocabulary.column_names();
    info!(
        "Vocabulary: {} columns starting {}",
        columns.len(),
        vocabulary.start_date()
    );

    let split = WinratePredictor::split(
        &x,
        &y,
        config.split.test_fraction,
        config.split.seed,
        config.split.policy,
    )?;

    let predictor = WinratePredictor::new(config.model.regressor_params(), config.model.clamp);
    let model = predictor.fit(vocabulary, &split.x_train, &split.y_train)?;
    let metrics = WinratePredictor::evaluate(&model, &split.x_test, &split.y_test)?;

    let report = TrainingReport {
        n_records: records.len(),
        n_train: split.x_train.len(),
        n_test: split.x_test.len(),
        columns,
        metrics,
    };
    Ok(TrainingOutcome { model, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictionError;
    use crate::domain::ml::split::SplitPolicy;
    use chrono::{Days, NaiveDate};

    fn records(n: u64) -> Vec<MatchRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        (0..n)
            .map(|i| {
                MatchRecord::new(
                    start + Days::new(i),
                    if i % 2 == 0 { "Control" } else { "Aggro" },
                    "League",
                    50.0 + 0.2 * i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_run_training_reports_sizes() {
        let outcome = run_training(&records(40), &PipelineConfig::default()).unwrap();
        let report = &outcome.report;
        assert_eq!(report.n_records, 40);
        assert_eq!(report.n_test, 8);
        assert_eq!(report.n_train, 32);
        assert_eq!(report.columns[0], "days_since_start");
        assert_eq!(report.columns.len(), outcome.model.vocabulary().width());
        assert!(report.metrics.r2 > 0.99);
    }

    #[test]
    fn test_chronological_policy_is_used() {
        let mut config = PipelineConfig::default();
        config.split.policy = SplitPolicy::Chronological;
        let outcome = run_training(&records(40), &config).unwrap();
        // Extrapolating a clean linear trend is still exact
        assert!(outcome.report.metrics.r2 > 0.99);
    }

    #[test]
    fn test_run_training_propagates_errors() {
        let err = run_training(&records(2), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PredictionError::InsufficientData { .. }));
    }
}
