//! Synthetic fallback dataset.
//!
//! Used when the remote table cannot be fetched, so the pipeline stays
//! runnable without network access. The rows are uniform noise and the
//! resulting model is not meaningful.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::RawDataset;
use crate::schema::FEATURE_COUNT;

/// Number of rows in the fallback dataset.
pub const FALLBACK_ROWS: usize = 100;

const FEATURE_RANGE: std::ops::Range<f32> = 0.0..10.0;
const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 3..=9;

/// Generate the fallback dataset: uniform random features and random
/// integer quality scores, reproducible for a fixed seed.
pub fn generate(rows: usize, seed: u64) -> RawDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Vec::with_capacity(rows);
    let mut quality = Vec::with_capacity(rows);
    for _ in 0..rows {
        let row: Vec<f32> = (0..FEATURE_COUNT)
            .map(|_| rng.random_range(FEATURE_RANGE))
            .collect();
        x.push(row);
        quality.push(rng.random_range(QUALITY_RANGE));
    }
    RawDataset { x, quality }
}
