//! Feature encoding configuration.

use super::VarLookup;
use crate::domain::types::CategoricalField;
use anyhow::{Result, bail};
use serde::Deserialize;

/// Encoding environment configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingEnvConfig {
    /// One-hot encoded fields, in column order.
    pub categorical_fields: Vec<CategoricalField>,
}

impl Default for EncodingEnvConfig {
    fn default() -> Self {
        Self {
            categorical_fields: vec![
                CategoricalField::OpponentArchetype,
                CategoricalField::EventType,
            ],
        }
    }
}

impl EncodingEnvConfig {
    /// Reads `DECKCAST_CATEGORICAL_FIELDS`, a comma-separated list of column names.
    pub fn apply_vars(&mut self, vars: VarLookup<'_>) -> Result<()> {
        if let Some(raw) = vars("DECKCAST_CATEGORICAL_FIELDS") {
            self.categorical_fields = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<CategoricalField>())
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (i, field) in self.categorical_fields.iter().enumerate() {
            if self.categorical_fields[..i].contains(field) {
                bail!("Categorical field '{}' listed more than once", field);
            }
        }
        Ok(())
    }
}
