use crate::domain::errors::PredictionResult;

/// Interface for fitted winrate regression backends
pub trait WinrateRegressor: Send + Sync {
    /// Predict one winrate per dense feature row
    fn predict_rows(&self, rows: Vec<Vec<f64>>) -> PredictionResult<Vec<f64>>;

    /// Predict a single row
    fn predict_row(&self, row: Vec<f64>) -> PredictionResult<f64> {
        self.predict_rows(vec![row])?
            .first()
            .copied()
            .ok_or_else(|| crate::domain::errors::PredictionError::Model {
                reason: "no prediction returned".to_string(),
            })
    }

    /// Get model name/type
    fn name(&self) -> &str;
}
