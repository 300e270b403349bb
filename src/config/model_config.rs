//! Regression model configuration.

use super::{VarLookup, parse_var};
use crate::application::ml::smartcore_predictor::{ModelKind, RegressorParams};
use crate::application::ml::winrate_predictor::ClampPolicy;
use anyhow::{Result, bail};
use serde::Deserialize;

/// Model environment configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelEnvConfig {
    pub kind: ModelKind,
    pub ridge_alpha: f64,

    // Random forest
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,

    pub clamp: ClampPolicy,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        let params = RegressorParams::default();
        Self {
            kind: params.kind,
            ridge_alpha: params.ridge_alpha,
            n_trees: params.n_trees,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            seed: params.seed,
            clamp: ClampPolicy::default(),
        }
    }
}

impl ModelEnvConfig {
    pub fn apply_vars(&mut self, vars: VarLookup<'_>) -> Result<()> {
        if let Some(v) = parse_var(vars, "DECKCAST_MODEL_KIND")? {
            self.kind = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_RIDGE_ALPHA")? {
            self.ridge_alpha = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_N_TREES")? {
            self.n_trees = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_MAX_DEPTH")? {
            self.max_depth = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_MIN_SAMPLES_SPLIT")? {
            self.min_samples_split = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_MODEL_SEED")? {
            self.seed = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_CLAMP")? {
            self.clamp = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ridge_alpha.is_finite() && self.ridge_alpha > 0.0) {
            bail!("ridge_alpha must be a positive number, got {}", self.ridge_alpha);
        }
        if self.n_trees == 0 {
            bail!("n_trees must be at least 1");
        }
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        if self.min_samples_split < 2 {
            bail!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            );
        }
        Ok(())
    }

    pub fn regressor_params(&self) -> RegressorParams {
        RegressorParams {
            kind: self.kind,
            ridge_alpha: self.ridge_alpha,
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }
}
