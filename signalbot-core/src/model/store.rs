//! On-disk model persistence: one JSON file per symbol.
//!
//! File layout (`trading_model_{SYMBOL}.json`):
//! - `schema_version`: rejected on load when newer than this build understands
//! - `checksum`: blake3 of the exact payload bytes
//! - `payload`: config + fitted columns, scaler and forest
//!
//! Floats are written with round-trip precision, so a reloaded model returns
//! bit-identical predictions.

use super::signal::{FittedModel, ModelConfig, SignalModel};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Current model file schema version.
pub const MODEL_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("no saved model at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("model file {} failed its checksum", path.display())]
    ChecksumMismatch { path: PathBuf },

    #[error("unsupported model schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Error)]
pub enum ModelSaveError {
    #[error("cannot save a model that has not been trained")]
    NotTrained,

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct ModelPayload {
    config: ModelConfig,
    fitted: FittedModel,
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    schema_version: u32,
    symbol: String,
    saved_at: NaiveDateTime,
    checksum: String,
    payload: Box<RawValue>,
}

/// Directory holding one model file per symbol.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/trading_model_{SYMBOL}.json`
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("trading_model_{}.json", symbol.to_uppercase()))
    }

    pub fn exists(&self, symbol: &str) -> bool {
        self.path_for(symbol).is_file()
    }

    /// Write the fitted model for `symbol`, replacing any previous file.
    pub fn save(&self, symbol: &str, model: &SignalModel) -> Result<PathBuf, ModelSaveError> {
        let fitted = model.fitted().ok_or(ModelSaveError::NotTrained)?;
        let payload = serde_json::to_string(&ModelPayload {
            config: model.config().clone(),
            fitted: fitted.clone(),
        })?;
        let checksum = blake3::hash(payload.as_bytes()).to_hex().to_string();

        let file = ModelFile {
            schema_version: MODEL_SCHEMA_VERSION,
            symbol: symbol.to_uppercase(),
            saved_at: chrono::Local::now().naive_local(),
            checksum,
            payload: RawValue::from_string(payload)?,
        };
        let json = serde_json::to_string(&file)?;

        let path = self.path_for(symbol);
        let io_err = |source| ModelSaveError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        // Atomic replace through a sibling temp file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        info!(symbol, path = %path.display(), "model saved");
        Ok(path)
    }

    /// Restore the model saved for `symbol`.
    pub fn load(&self, symbol: &str) -> Result<SignalModel, ModelLoadError> {
        let path = self.path_for(symbol);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelLoadError::NotFound { path })
            }
            Err(source) => return Err(ModelLoadError::Io { path, source }),
        };

        let corrupt = |reason: String| ModelLoadError::Corrupt {
            path: path.clone(),
            reason,
        };
        let file: ModelFile = serde_json::from_str(&json).map_err(|e| corrupt(e.to_string()))?;
        if file.schema_version > MODEL_SCHEMA_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                found: file.schema_version,
                supported: MODEL_SCHEMA_VERSION,
            });
        }
        let actual = blake3::hash(file.payload.get().as_bytes()).to_hex().to_string();
        if actual != file.checksum {
            return Err(ModelLoadError::ChecksumMismatch { path });
        }

        let payload: ModelPayload =
            serde_json::from_str(file.payload.get()).map_err(|e| corrupt(e.to_string()))?;
        if payload.fitted.columns.len() != payload.fitted.scaler.width()
            || payload.fitted.columns.len() != payload.fitted.forest.width()
        {
            return Err(corrupt("feature width does not match column list".into()));
        }

        debug!(symbol, saved_at = %file.saved_at, "model loaded");
        Ok(SignalModel::from_fitted(payload.config, payload.fitted))
    }
}
