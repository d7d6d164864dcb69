//! Feature schema shared by the trainer and the prediction service.
//!
//! The eleven physico-chemical measurements are an ordered contract: the
//! trainer fits on rows in this order and the serving side must assemble
//! inference rows the same way. The schema travels inside the persisted
//! model so a stale or foreign artifact is rejected at load time instead of
//! failing with an opaque shape error during prediction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of input features per wine sample.
pub const FEATURE_COUNT: usize = 11;

/// Column name of the raw quality score in the source table.
pub const QUALITY_COLUMN: &str = "quality";

/// Class names indexed by label value.
pub const CLASS_NAMES: [&str; 2] = ["average/low quality", "good quality"];

/// Static description of one input feature.
///
/// The bounds, default, and step mirror the plausible value ranges of the
/// red-wine table and drive the form sliders. They are advisory UI
/// affordances, not validation the model enforces.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Column name, exactly as it appears in the source table.
    pub name: &'static str,
    /// Lower slider bound.
    pub min: f32,
    /// Upper slider bound.
    pub max: f32,
    /// Default slider value.
    pub default: f32,
    /// Slider step size.
    pub step: f32,
}

/// Ordered feature table. Order is part of the model contract.
pub const FIELDS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec { name: "fixed acidity", min: 4.0, max: 16.0, default: 8.0, step: 0.1 },
    FieldSpec { name: "volatile acidity", min: 0.1, max: 2.0, default: 0.5, step: 0.01 },
    FieldSpec { name: "citric acid", min: 0.0, max: 1.0, default: 0.25, step: 0.01 },
    FieldSpec { name: "residual sugar", min: 0.0, max: 16.0, default: 2.5, step: 0.1 },
    FieldSpec { name: "chlorides", min: 0.0, max: 0.7, default: 0.08, step: 0.001 },
    FieldSpec { name: "free sulfur dioxide", min: 1.0, max: 72.0, default: 15.0, step: 1.0 },
    FieldSpec { name: "total sulfur dioxide", min: 6.0, max: 289.0, default: 46.0, step: 1.0 },
    FieldSpec { name: "density", min: 0.99, max: 1.01, default: 0.996, step: 0.0001 },
    FieldSpec { name: "pH", min: 2.0, max: 5.0, default: 3.3, step: 0.01 },
    FieldSpec { name: "sulphates", min: 0.0, max: 2.0, default: 0.65, step: 0.01 },
    FieldSpec { name: "alcohol", min: 8.0, max: 15.0, default: 10.0, step: 0.1 },
];

/// Error raised when a persisted schema disagrees with this build.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Feature schema mismatch: model expects [{expected}] but this build uses [{found}]")]
    Mismatch {
        expected: String,
        found: String,
    },
}

/// Ordered list of feature names embedded alongside a serialized model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Feature column names in training order.
    pub feature_names: Vec<String>,
}

impl FeatureSchema {
    /// Schema for the feature table compiled into this build.
    pub fn current() -> Self {
        Self {
            feature_names: FIELDS.iter().map(|field| field.name.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    /// Check that `self` (from a persisted model) matches `other` exactly,
    /// including order.
    pub fn check_matches(&self, other: &FeatureSchema) -> Result<(), SchemaError> {
        if self.feature_names == other.feature_names {
            Ok(())
        } else {
            Err(SchemaError::Mismatch {
                expected: self.feature_names.join(", "),
                found: other.feature_names.join(", "),
            })
        }
    }
}

/// Feature row with every slider at its default value.
pub fn default_row() -> Vec<f32> {
    FIELDS.iter().map(|field| field.default).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_schema_matches_field_table() {
        let schema = FeatureSchema::current();
        assert_eq!(schema.len(), FEATURE_COUNT);
        assert_eq!(schema.feature_names[0], "fixed acidity");
        assert_eq!(schema.feature_names[8], "pH");
        assert_eq!(schema.feature_names[10], "alcohol");
    }

    #[test]
    fn identical_schemas_match() {
        let schema = FeatureSchema::current();
        assert!(schema.check_matches(&FeatureSchema::current()).is_ok());
    }

    #[test]
    fn reordered_schema_is_rejected() {
        let mut reordered = FeatureSchema::current();
        reordered.feature_names.swap(0, 1);
        let err = reordered
            .check_matches(&FeatureSchema::current())
            .unwrap_err();
        assert!(matches!(err, SchemaError::Mismatch { .. }));
    }

    #[test]
    fn default_row_uses_slider_defaults() {
        let row = default_row();
        assert_eq!(row.len(), FEATURE_COUNT);
        assert_eq!(row[0], 8.0);
        assert_eq!(row[7], 0.996);
        assert_eq!(row[10], 10.0);
    }
}
