use super::predictor::WinrateRegressor;
use crate::domain::errors::{PredictionError, PredictionResult};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{
    RidgeRegression, RidgeRegressionParameters, RidgeRegressionSolverName,
};
use std::fmt;
use std::str::FromStr;

/// Regression family used for the winrate surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Least squares over `[days, one-hot..., 1]`.
    #[default]
    Linear,
    RandomForest,
}

impl FromStr for ModelKind {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "linear_regression" | "ols" => Ok(ModelKind::Linear),
            "random_forest" | "forest" | "rf" => Ok(ModelKind::RandomForest),
            _ => Err(PredictionError::schema(format!(
                "invalid model kind: {}. Must be 'linear' or 'random_forest'",
                s
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Linear => f.write_str("linear"),
            ModelKind::RandomForest => f.write_str("random_forest"),
        }
    }
}

/// Backend hyperparameters. Only the fields relevant to `kind` are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorParams {
    pub kind: ModelKind,
    /// Tikhonov term keeping the normal equations solvable when one-hot
    /// groups are collinear with the intercept.
    pub ridge_alpha: f64,
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RegressorParams {
    fn default() -> Self {
        Self {
            kind: ModelKind::Linear,
            ridge_alpha: 1e-4,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// Fitted smartcore model.
#[derive(Debug, Serialize, Deserialize)]
pub enum SmartCoreRegressor {
    Linear(RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

fn backend_error(stage: &str, e: impl fmt::Display) -> PredictionError {
    PredictionError::Model {
        reason: format!("{} failed: {}", stage, e),
    }
}

/// Appends the constant column the linear backend uses as its intercept.
fn with_intercept(mut rows: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    for row in rows.iter_mut() {
        row.push(1.0);
    }
    rows
}

/// Adds one `sqrt(alpha) * e_j` row (target 0) per feature column, leaving
/// the trailing intercept column unpenalized.
///
/// The stacked system has the normal equations of ridge regression, so the
/// backend is fitted with `alpha = 0`. It is positive definite for any
/// non-empty input and always has more rows than columns once two
/// observations are present.
fn with_penalty_rows(
    mut rows: Vec<Vec<f64>>,
    mut targets: Vec<f64>,
    alpha: f64,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let width = rows.first().map_or(0, |r| r.len());
    let features = width.saturating_sub(1);
    let scale = alpha.sqrt();
    for j in 0..features {
        let mut row = vec![0.0; width];
        row[j] = scale;
        rows.push(row);
        targets.push(0.0);
    }
    (rows, targets)
}

impl SmartCoreRegressor {
    pub fn fit(
        rows: Vec<Vec<f64>>,
        targets: &[f64],
        params: &RegressorParams,
    ) -> PredictionResult<Self> {
        let y = targets.to_vec();
        match params.kind {
            ModelKind::Linear => {
                let (rows, y) = with_penalty_rows(with_intercept(rows), y, params.ridge_alpha);
                let x = DenseMatrix::from_2d_vec(&rows)
                    .map_err(|e| backend_error("Matrix creation", e))?;
                let ridge = RidgeRegressionParameters::default()
                    .with_alpha(0.0)
                    .with_normalize(false)
                    .with_solver(RidgeRegressionSolverName::Cholesky);
                RidgeRegression::fit(&x, &y, ridge)
                    .map(SmartCoreRegressor::Linear)
                    .map_err(|e| backend_error("Linear training", e))
            }
            ModelKind::RandomForest => {
                let x = DenseMatrix::from_2d_vec(&rows)
                    .map_err(|e| backend_error("Matrix creation", e))?;
                let forest = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split)
                    .with_seed(params.seed);
                RandomForestRegressor::fit(&x, &y, forest)
                    .map(SmartCoreRegressor::RandomForest)
                    .map_err(|e| backend_error("Random forest training", e))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            SmartCoreRegressor::Linear(_) => ModelKind::Linear,
            SmartCoreRegressor::RandomForest(_) => ModelKind::RandomForest,
        }
    }
}

impl WinrateRegressor for SmartCoreRegressor {
    fn predict_rows(&self, rows: Vec<Vec<f64>>) -> PredictionResult<Vec<f64>> {
        match self {
            SmartCoreRegressor::Linear(model) => {
                let x = DenseMatrix::from_2d_vec(&with_intercept(rows))
                    .map_err(|e| backend_error("Matrix creation", e))?;
                model.predict(&x).map_err(|e| backend_error("Prediction", e))
            }
            SmartCoreRegressor::RandomForest(model) => {
                let x = DenseMatrix::from_2d_vec(&rows)
                    .map_err(|e| backend_error("Matrix creation", e))?;
                model.predict(&x).map_err(|e| backend_error("Prediction", e))
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            SmartCoreRegressor::Linear(_) => "SmartCore Linear Regression",
            SmartCoreRegressor::RandomForest(_) => "SmartCore Random Forest",
        }
    }
}
