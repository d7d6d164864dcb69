//! Seeded random-forest classifier.
//!
//! This is a lightweight ensemble that avoids external ML dependencies while
//! still supporting:
//! - Bootstrap-resampled trees with per-split feature subsampling.
//! - Class-probability output via averaged leaf distributions.
//! - Reproducible JSON model export/load with an embedded feature schema.

mod model;
mod train;

pub use model::{ForestModel, MODEL_VERSION, TreeNode};
pub use train::{TrainDataset, TrainOptions, train_forest};
