//! Train/test split configuration.

use super::{VarLookup, parse_var};
use crate::domain::ml::split::SplitPolicy;
use anyhow::{Result, bail};
use serde::Deserialize;

/// Split environment configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitEnvConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub policy: SplitPolicy,
}

impl Default for SplitEnvConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            policy: SplitPolicy::Random,
        }
    }
}

impl SplitEnvConfig {
    pub fn apply_vars(&mut self, vars: VarLookup<'_>) -> Result<()> {
        if let Some(v) = parse_var(vars, "DECKCAST_TEST_FRACTION")? {
            self.test_fraction = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_SPLIT_SEED")? {
            self.seed = v;
        }
        if let Some(v) = parse_var(vars, "DECKCAST_SPLIT_POLICY")? {
            self.policy = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!(
                "test_fraction must be between 0 and 1 (exclusive), got {}",
                self.test_fraction
            );
        }
        Ok(())
    }
}
