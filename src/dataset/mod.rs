//! Wine-quality dataset acquisition and preparation.

pub mod fetch;
pub mod split;
pub mod synthetic;

use serde::{Deserialize, Serialize};

/// Raw quality score above which a wine counts as good.
pub const GOOD_QUALITY_THRESHOLD: u8 = 6;

/// Where the rows a model was fitted on came from.
///
/// Recorded in the persisted artifact so a model trained on the synthetic
/// fallback is distinguishable from one trained on the real table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProvenance {
    /// Rows fetched from the remote wine-quality table.
    Remote,
    /// Synthetic random rows generated because the fetch failed or was
    /// skipped. Keeps the pipeline runnable offline; the model is not
    /// meaningful.
    SyntheticFallback,
}

impl DataProvenance {
    pub fn describe(self) -> &'static str {
        match self {
            DataProvenance::Remote => "remote dataset",
            DataProvenance::SyntheticFallback => "synthetic fallback data",
        }
    }
}

/// Labeled-but-unsplit dataset: feature rows plus raw quality scores.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Feature matrix, row-major, columns in schema order.
    pub x: Vec<Vec<f32>>,
    /// Raw ordinal quality score per row.
    pub quality: Vec<u8>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Derive binary labels from the raw quality scores.
    pub fn labels(&self) -> Vec<usize> {
        self.quality
            .iter()
            .map(|&q| quality_label(q) as usize)
            .collect()
    }
}

/// Binarize a raw quality score: 1 iff the score exceeds the threshold.
///
/// This derivation happens only at training time; inference never sees the
/// raw score.
pub fn quality_label(quality: u8) -> u8 {
    if quality > GOOD_QUALITY_THRESHOLD { 1 } else { 0 }
}
