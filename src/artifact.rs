//! Model artifact persistence.
//!
//! The fitted forest is one JSON file living next to the executables so the
//! binaries work regardless of invocation directory. The trainer overwrites
//! it wholesale; the serving side loads it once at startup and never writes.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ml::forest::ForestModel;
use crate::schema::{FeatureSchema, SchemaError};

/// Fixed artifact file name.
pub const MODEL_FILE_NAME: &str = "model.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact does not exist yet. The message is user-facing and
    /// actionable: prediction stays disabled until the trainer has run.
    #[error("Model artifact not found at {path}. Run cuvee-train first to produce one.")]
    Missing { path: PathBuf },
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Model artifact {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model artifact {path} failed validation: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Directory of the running executable. The artifact and log files live
/// beside the binaries rather than in the working directory.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default artifact location: `model.json` next to the executable.
pub fn default_path() -> PathBuf {
    executable_dir().join(MODEL_FILE_NAME)
}

/// Serialize a model to `path`, creating parent directories and replacing
/// any prior artifact.
pub fn save(path: &Path, model: &ForestModel) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let bytes = serde_json::to_vec_pretty(model).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate a model from `path`.
///
/// A missing file is reported as [`ArtifactError::Missing`] so callers can
/// degrade gracefully; the embedded feature schema must match the one
/// compiled into this build.
pub fn load(path: &Path) -> Result<ForestModel, ArtifactError> {
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let model: ForestModel =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    model.validate().map_err(|message| ArtifactError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    model.schema.check_matches(&FeatureSchema::current())?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataProvenance, synthetic};
    use crate::ml::forest::{TrainDataset, TrainOptions, train_forest};
    use crate::schema::{self, CLASS_NAMES};
    use tempfile::tempdir;

    fn synthetic_model(trees: usize) -> ForestModel {
        let raw = synthetic::generate(60, 42);
        let dataset = TrainDataset {
            schema: FeatureSchema::current(),
            classes: CLASS_NAMES.iter().map(|name| name.to_string()).collect(),
            provenance: DataProvenance::SyntheticFallback,
            y: raw.labels(),
            x: raw.x,
        };
        let options = TrainOptions {
            trees,
            ..TrainOptions::default()
        };
        train_forest(&dataset, &options).unwrap()
    }

    #[test]
    fn save_then_load_round_trips_predictions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        let model = synthetic_model(10);
        save(&path, &model).unwrap();

        let loaded = load(&path).unwrap();
        let row = schema::default_row();
        assert_eq!(model.predict_proba(&row), loaded.predict_proba(&row));
        assert_eq!(
            model.predict_class_index(&row),
            loaded.predict_class_index(&row)
        );
    }

    #[test]
    fn missing_artifact_is_reported_as_missing() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join(MODEL_FILE_NAME)).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
    }

    #[test]
    fn corrupt_artifact_is_reported_as_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        fs::write(&path, b"not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }

    #[test]
    fn foreign_schema_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        let mut model = synthetic_model(3);
        model.schema.feature_names.swap(0, 1);
        save(&path, &model).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Schema(_)));
    }

    #[test]
    fn structurally_invalid_artifact_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        let mut model = synthetic_model(3);
        model.trees.clear();
        save(&path, &model).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { .. }));
    }
}
