use super::predictor::WinrateRegressor;
use super::smartcore_predictor::{ModelKind, RegressorParams, SmartCoreRegressor};
use crate::domain::errors::{PredictionError, PredictionResult};
use crate::domain::ml::feature_encoder::FeatureEncoder;
use crate::domain::ml::feature_registry::{FeatureVector, Vocabulary, to_rows};
use crate::domain::ml::split::{SplitPolicy, TrainTestSplit, train_test_split};
use crate::domain::performance::metrics::RegressionMetrics;
use crate::domain::types::{MatchContext, WinratePrediction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Whether point estimates are forced into the valid percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Raw regression output; may fall outside [0, 100] when extrapolating.
    #[default]
    Unclamped,
    /// Clamp to [0, 100].
    Percentage,
}

impl ClampPolicy {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            ClampPolicy::Unclamped => value,
            ClampPolicy::Percentage => value.clamp(0.0, 100.0),
        }
    }
}

impl FromStr for ClampPolicy {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unclamped" | "none" | "off" => Ok(ClampPolicy::Unclamped),
            "percentage" | "clamp" | "on" => Ok(ClampPolicy::Percentage),
            _ => Err(PredictionError::schema(format!(
                "invalid clamp policy: {}. Must be 'unclamped' or 'percentage'",
                s
            ))),
        }
    }
}

impl fmt::Display for ClampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClampPolicy::Unclamped => f.write_str("unclamped"),
            ClampPolicy::Percentage => f.write_str("percentage"),
        }
    }
}

/// A trained winrate model bound to the vocabulary it was trained with.
///
/// Immutable once built. Retraining produces a new value; callers replace
/// the whole model rather than mutating one in place. Saving and loading go
/// through this type so vocabulary and parameters always travel together.
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedModel {
    vocabulary: Vocabulary,
    regressor: SmartCoreRegressor,
    clamp: ClampPolicy,
    trained_on: usize,
}

impl FittedModel {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn kind(&self) -> ModelKind {
        self.regressor.kind()
    }

    pub fn name(&self) -> &str {
        self.regressor.name()
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.clamp
    }

    /// Number of rows the model was fitted on.
    pub fn trained_on(&self) -> usize {
        self.trained_on
    }

    fn check_width(&self, x: &FeatureVector) -> PredictionResult<()> {
        if x.width() != self.vocabulary.width() {
            return Err(PredictionError::schema(format!(
                "feature vector has {} columns, model expects {}",
                x.width(),
                self.vocabulary.width()
            )));
        }
        Ok(())
    }

    fn predict_vectors(&self, xs: &[FeatureVector]) -> PredictionResult<Vec<f64>> {
        for x in xs {
            self.check_width(x)?;
        }
        let raw = self.regressor.predict_rows(to_rows(xs))?;
        if raw.len() != xs.len() {
            return Err(PredictionError::Model {
                reason: format!("{} predictions for {} rows", raw.len(), xs.len()),
            });
        }
        Ok(raw.into_iter().map(|v| self.clamp.apply(v)).collect())
    }
}

/// Fits, evaluates and queries winrate models.
#[derive(Debug, Clone, Default)]
pub struct WinratePredictor {
    params: RegressorParams,
    clamp: ClampPolicy,
}

impl WinratePredictor {
    pub fn new(params: RegressorParams, clamp: ClampPolicy) -> Self {
        Self { params, clamp }
    }

    pub fn params(&self) -> &RegressorParams {
        &self.params
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.clamp
    }

    /// Holds out `round(test_fraction * n)` rows; see `train_test_split`.
    pub fn split(
        x: &[FeatureVector],
        y: &[f64],
        test_fraction: f64,
        seed: u64,
        policy: SplitPolicy,
    ) -> PredictionResult<TrainTestSplit> {
        let split = train_test_split(x, y, test_fraction, seed, policy)?;
        info!(
            "Split {} rows ({} policy, seed {}): {} train / {} test",
            x.len(),
            policy,
            seed,
            split.x_train.len(),
            split.x_test.len()
        );
        Ok(split)
    }

    /// Fits a model on rows encoded with `vocabulary`, which the model takes
    /// ownership of.
    pub fn fit(
        &self,
        vocabulary: Vocabulary,
        x_train: &[FeatureVector],
        y_train: &[f64],
    ) -> PredictionResult<FittedModel> {
        if x_train.len() != y_train.len() {
            return Err(PredictionError::schema(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x_train.len(),
                y_train.len()
            )));
        }
        if x_train.len() < 2 {
            return Err(PredictionError::insufficient(format!(
                "need at least 2 training rows, got {}",
                x_train.len()
            )));
        }
        for (index, (x, y)) in x_train.iter().zip(y_train).enumerate() {
            if x.width() != vocabulary.width() {
                return Err(PredictionError::schema(format!(
                    "training row {} has {} columns, vocabulary defines {}",
                    index,
                    x.width(),
                    vocabulary.width()
                )));
            }
            if !y.is_finite() {
                return Err(PredictionError::Parse {
                    index,
                    reason: format!("winrate {} is not a finite number", y),
                });
            }
        }

        info!(
            "Training {} model on {} rows x {} columns",
            self.params.kind,
            x_train.len(),
            vocabulary.width()
        );
        let regressor = SmartCoreRegressor::fit(to_rows(x_train), y_train, &self.params)?;

        Ok(FittedModel {
            vocabulary,
            regressor,
            clamp: self.clamp,
            trained_on: x_train.len(),
        })
    }

    /// Hold-out metrics for `model` on `(x_test, y_test)`.
    pub fn evaluate(
        model: &FittedModel,
        x_test: &[FeatureVector],
        y_test: &[f64],
    ) -> PredictionResult<RegressionMetrics> {
        if x_test.is_empty() {
            return Err(PredictionError::insufficient(
                "cannot evaluate on an empty test set",
            ));
        }
        if x_test.len() != y_test.len() {
            return Err(PredictionError::schema(format!(
                "test rows ({}) and targets ({}) differ in length",
                x_test.len(),
                y_test.len()
            )));
        }
        let predictions = model.predict_vectors(x_test)?;
        let metrics = RegressionMetrics::from_predictions(&predictions, y_test)?;
        info!("Hold-out evaluation: {}", metrics);
        Ok(metrics)
    }

    /// Point estimate for one encoded vector.
    pub fn predict(model: &FittedModel, x: &FeatureVector) -> PredictionResult<f64> {
        model.check_width(x)?;
        let raw = model.regressor.predict_row(x.to_row())?;
        Ok(model.clamp.apply(raw))
    }

    /// Point estimates for many encoded vectors, in input order.
    pub fn predict_many(model: &FittedModel, xs: &[FeatureVector]) -> PredictionResult<Vec<f64>> {
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        model.predict_vectors(xs)
    }

    /// Encodes `context` with the model's own vocabulary and predicts.
    pub fn predict_context(
        model: &FittedModel,
        context: &MatchContext,
    ) -> PredictionResult<WinratePrediction> {
        let x = FeatureEncoder::transform_one(context, 0, model.vocabulary())?;
        let winrate = Self::predict(model, &x)?;
        debug!(
            "Predicted {:.2}% vs {} on {}",
            winrate, context.opponent_archetype, context.date
        );
        Ok(WinratePrediction {
            context: context.clone(),
            winrate,
        })
    }
}
