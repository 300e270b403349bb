use crate::domain::errors::{PredictionError, PredictionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hold-out regression quality of a winrate model.
///
/// `r2` uses the mean of the evaluated targets as its baseline, so it can be
/// negative for a model that does worse than predicting that mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub n: usize,
}

impl RegressionMetrics {
    /// Computes metrics from paired predictions and observed targets.
    ///
    /// A constant target set has zero total variance; r2 is then 1.0 for a
    /// perfect fit and 0.0 otherwise instead of NaN.
    pub fn from_predictions(predictions: &[f64], actuals: &[f64]) -> PredictionResult<Self> {
        if predictions.len() != actuals.len() {
            return Err(PredictionError::schema(format!(
                "{} predictions for {} targets",
                predictions.len(),
                actuals.len()
            )));
        }
        if actuals.is_empty() {
            return Err(PredictionError::insufficient(
                "cannot evaluate on an empty test set",
            ));
        }

        let n = actuals.len();
        let mean_y = actuals.iter().sum::<f64>() / n as f64;

        let mut ssr = 0.0;
        let mut sst = 0.0;
        let mut abs_sum = 0.0;
        for (pred, actual) in predictions.iter().zip(actuals) {
            let residual = actual - pred;
            ssr += residual * residual;
            abs_sum += residual.abs();
            sst += (actual - mean_y).powi(2);
        }

        let r2 = if sst > 0.0 {
            1.0 - ssr / sst
        } else if ssr == 0.0 {
            1.0
        } else {
            0.0
        };
        let mse = ssr / n as f64;

        Ok(Self {
            r2,
            mse,
            rmse: mse.sqrt(),
            mae: abs_sum / n as f64,
            n,
        })
    }

    pub fn is_finite(&self) -> bool {
        self.r2.is_finite() && self.mse.is_finite()
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R²={:.4} MSE={:.4} RMSE={:.4} MAE={:.4} (n={})",
            self.r2, self.mse, self.rmse, self.mae, self.n
        )
    }
}
