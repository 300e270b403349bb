//! Batch forecasting of future winrates across every known matchup.

use super::winrate_predictor::{FittedModel, WinratePredictor};
use crate::domain::errors::{PredictionError, PredictionResult};
use crate::domain::ml::feature_encoder::FeatureEncoder;
use crate::domain::types::{CategoricalField, MatchContext};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::info;

/// Date range and fixed context for a forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub step_days: u32,
    pub event_type: String,
    pub deck_version: Option<String>,
    pub meta_shift: Option<String>,
}

impl ForecastRequest {
    pub fn new(start: NaiveDate, end: NaiveDate, event_type: impl Into<String>) -> Self {
        Self {
            start,
            end,
            step_days: 1,
            event_type: event_type.into(),
            deck_version: None,
            meta_shift: None,
        }
    }

    pub fn with_step_days(mut self, step_days: u32) -> Self {
        self.step_days = step_days;
        self
    }
}

/// Predicted winrate for one date.
///
/// `predicted_winrate` is the unweighted mean over `matchups`, which are in
/// vocabulary order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub predicted_winrate: f64,
    pub matchups: Vec<(String, f64)>,
}

/// Predicts every opponent archetype in the model's vocabulary for each date
/// from `start` to `end` inclusive.
pub fn forecast(model: &FittedModel, request: &ForecastRequest) -> PredictionResult<Vec<ForecastRow>> {
    if request.step_days == 0 {
        return Err(PredictionError::schema("forecast step must be at least one day"));
    }
    if request.start > request.end {
        return Err(PredictionError::schema(format!(
            "forecast start {} is after end {}",
            request.start, request.end
        )));
    }
    let archetypes = model.vocabulary().values(CategoricalField::OpponentArchetype);
    if archetypes.is_empty() {
        return Err(PredictionError::schema(
            "model does not encode opponent_archetype; nothing to forecast against",
        ));
    }

    let mut dates = Vec::new();
    let mut date = request.start;
    while date <= request.end {
        dates.push(date);
        date = match date.checked_add_days(Days::new(request.step_days as u64)) {
            Some(next) => next,
            None => break,
        };
    }

    // Encode everything first so the run fails before producing any rows.
    let mut contexts = Vec::with_capacity(dates.len() * archetypes.len());
    for &date in &dates {
        for archetype in archetypes {
            let mut context = MatchContext::new(date, archetype.as_str(), request.event_type.as_str());
            context.deck_version = request.deck_version.clone();
            context.meta_shift = request.meta_shift.clone();
            contexts.push(context);
        }
    }
    let vectors = FeatureEncoder::transform(&contexts, model.vocabulary())?;
    let predictions = WinratePredictor::predict_many(model, &vectors)?;

    let rows: Vec<ForecastRow> = dates
        .iter()
        .zip(predictions.chunks(archetypes.len()))
        .map(|(&date, chunk)| {
            let matchups: Vec<(String, f64)> = archetypes
                .iter()
                .cloned()
                .zip(chunk.iter().copied())
                .collect();
            let predicted_winrate = chunk.iter().sum::<f64>() / chunk.len() as f64;
            ForecastRow {
                date,
                predicted_winrate,
                matchups,
            }
        })
        .collect();

    info!(
        "Forecast {} dates x {} archetypes ({} to {}, {})",
        rows.len(),
        archetypes.len(),
        request.start,
        request.end,
        request.event_type
    );
    Ok(rows)
}
