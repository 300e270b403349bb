//! Persistence for trained winrate models.
//!
//! A model file always holds the vocabulary and the regression parameters
//! together, so a loaded model can only ever encode with its own vocabulary.

use crate::application::ml::winrate_predictor::FittedModel;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bumped whenever the serialized layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ModelArtifactRef<'a> {
    format_version: u32,
    created_at: DateTime<Utc>,
    model: &'a FittedModel,
}

#[derive(Deserialize)]
struct ModelArtifact {
    format_version: u32,
    created_at: DateTime<Utc>,
    model: FittedModel,
}

/// Reads and writes a single model artifact as JSON.
pub struct ModelStore {
    file_path: PathBuf,
}

impl ModelStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Sibling of the target with `.tmp` appended to the full file name.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    /// Writes `model`, replacing any previous artifact in one rename.
    pub fn save(&self, model: &FittedModel) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create model directory")?;
            }
        }

        let artifact = ModelArtifactRef {
            format_version: MODEL_FORMAT_VERSION,
            created_at: Utc::now(),
            model,
        };
        let content = serde_json::to_string(&artifact).context("Failed to serialize model")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.temp_path();
        fs::write(&temp_path, content).context("Failed to write temp model file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename model file")?;

        info!(
            "Saved {} model ({} columns) to {:?}",
            model.kind(),
            model.vocabulary().width(),
            self.file_path
        );
        Ok(())
    }

    pub fn load(&self) -> Result<FittedModel> {
        let content = fs::read_to_string(&self.file_path)
            .context(format!("Failed to read model file {:?}", self.file_path))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&content).context("Failed to parse model JSON")?;

        if artifact.format_version != MODEL_FORMAT_VERSION {
            bail!(
                "Unsupported model format version {} in {:?} (expected {})",
                artifact.format_version,
                self.file_path,
                MODEL_FORMAT_VERSION
            );
        }

        info!(
            "Loaded {} model trained on {} rows at {} from {:?}",
            artifact.model.kind(),
            artifact.model.trained_on(),
            artifact.created_at,
            self.file_path
        );
        Ok(artifact.model)
    }
}
