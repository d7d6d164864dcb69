use serde::{Deserialize, Serialize};

use crate::dataset::DataProvenance;
use crate::schema::FeatureSchema;

/// Current model format version.
pub const MODEL_VERSION: i64 = 1;

/// Node of a fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal split on one feature: `feature <= threshold` goes left.
    Split {
        feature_index: u16,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Terminal node holding per-class training counts.
    Leaf { class_counts: Vec<u32> },
}

impl TreeNode {
    /// Walk the tree and return the leaf class counts for a feature vector.
    pub fn leaf_counts(&self, features: &[f32]) -> &[u32] {
        match self {
            TreeNode::Leaf { class_counts } => class_counts,
            TreeNode::Split {
                feature_index,
                threshold,
                left,
                right,
            } => {
                let value = features.get(*feature_index as usize).copied().unwrap_or(0.0);
                if value <= *threshold {
                    left.leaf_counts(features)
                } else {
                    right.leaf_counts(features)
                }
            }
        }
    }

    fn check(&self, n_classes: usize, n_features: usize) -> Result<(), String> {
        match self {
            TreeNode::Leaf { class_counts } => {
                if class_counts.len() != n_classes {
                    return Err(format!(
                        "Leaf has {} class counts but expected {}",
                        class_counts.len(),
                        n_classes
                    ));
                }
                if class_counts.iter().all(|&c| c == 0) {
                    return Err("Leaf has no training examples".to_string());
                }
                Ok(())
            }
            TreeNode::Split {
                feature_index,
                left,
                right,
                ..
            } => {
                if *feature_index as usize >= n_features {
                    return Err(format!(
                        "Split references feature {} but the schema has {}",
                        feature_index, n_features
                    ));
                }
                left.check(n_classes, n_features)?;
                right.check(n_classes, n_features)
            }
        }
    }
}

/// Random-forest model for binary wine-quality classification.
///
/// The artifact is immutable once written: the trainer replaces it
/// wholesale and the serving side treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Feature schema the model was fitted on.
    pub schema: FeatureSchema,
    /// Ordered list of class names, indexed by label value.
    pub classes: Vec<String>,
    /// Where the training rows came from.
    pub provenance: DataProvenance,
    /// Seed the forest was grown with.
    pub seed: u64,
    /// Fitted trees.
    pub trees: Vec<TreeNode>,
}

impl ForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema.is_empty() {
            return Err("Model schema has no features".to_string());
        }
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model contains no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.check(self.classes.len(), self.schema.len())
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Predict class probabilities as the average of per-tree leaf
    /// distributions. The result always sums to 1.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        let n_classes = self.classes.len();
        let mut probs = vec![0.0f32; n_classes];
        if self.trees.is_empty() {
            return vec![1.0 / n_classes as f32; n_classes];
        }
        for tree in &self.trees {
            let counts = tree.leaf_counts(features);
            let total: u32 = counts.iter().sum();
            if total == 0 {
                continue;
            }
            for (class_idx, &count) in counts.iter().enumerate().take(n_classes) {
                probs[class_idx] += count as f32 / total as f32;
            }
        }
        let sum: f32 = probs.iter().sum();
        if sum == 0.0 {
            return vec![1.0 / n_classes as f32; n_classes];
        }
        for p in &mut probs {
            *p /= sum;
        }
        probs
    }

    /// Predict the best class index for a feature vector.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}
