//! Deterministic train/test splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Fraction of rows held out for evaluation.
pub const TEST_FRACTION: f32 = 0.2;

/// Shuffle row indices with a seeded RNG and split off the trailing
/// fraction as the test partition.
///
/// The same seed and row count always produce the same partitions.
pub fn split_indices(rows: usize, test_fraction: f32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test_len = (rows as f32 * test_fraction).round() as usize;
    if rows >= 2 {
        test_len = test_len.clamp(1, rows - 1);
    } else {
        test_len = 0;
    }
    let train_len = rows - test_len;
    let test = indices.split_off(train_len);
    (indices, test)
}

/// Materialize a row subset in index order.
pub fn take_rows<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&idx| rows[idx].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn split_is_deterministic_for_fixed_seed() {
        let (train_a, test_a) = split_indices(100, TEST_FRACTION, 42);
        let (train_b, test_b) = split_indices(100, TEST_FRACTION, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn different_seeds_produce_different_shuffles() {
        let (train_a, _) = split_indices(100, TEST_FRACTION, 1);
        let (train_b, _) = split_indices(100, TEST_FRACTION, 2);
        assert_ne!(train_a, train_b);
    }

    #[test]
    fn partitions_are_disjoint_and_cover_all_rows() {
        let (train, test) = split_indices(100, TEST_FRACTION, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        let all: BTreeSet<usize> = train.iter().chain(test.iter()).copied().collect();
        assert_eq!(all.len(), 100);
        assert_eq!(all.iter().copied().max(), Some(99));
    }

    #[test]
    fn tiny_datasets_keep_at_least_one_row_per_side() {
        let (train, test) = split_indices(2, TEST_FRACTION, 42);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 1);
        let (train, test) = split_indices(1, TEST_FRACTION, 42);
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn take_rows_follows_index_order() {
        let rows = vec!["a", "b", "c", "d"];
        assert_eq!(take_rows(&rows, &[2, 0]), vec!["c", "a"]);
    }
}
