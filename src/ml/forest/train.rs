use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::model::{ForestModel, MODEL_VERSION, TreeNode};
use crate::dataset::DataProvenance;
use crate::schema::FeatureSchema;

/// Training hyperparameters for the forest.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of trees in the ensemble.
    pub trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum number of rows per leaf.
    pub min_leaf: usize,
    /// Number of bins used for split search.
    pub bins: usize,
    /// RNG seed for bootstrap resampling and feature subsampling.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 12,
            min_leaf: 2,
            bins: 32,
            seed: 42,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Feature schema the rows follow.
    pub schema: FeatureSchema,
    /// Ordered list of class names.
    pub classes: Vec<String>,
    /// Where the rows came from.
    pub provenance: DataProvenance,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

/// Train a random forest: bootstrap-resampled trees with per-split feature
/// subsampling, grown greedily on binned gini splits.
///
/// Fixed seed and fixed input rows produce an identical model.
pub fn train_forest(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<ForestModel, String> {
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if dataset.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    let n_classes = dataset.classes.len();
    if n_classes < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    if options.trees == 0 {
        return Err("Need at least 1 tree".to_string());
    }
    let d = dataset.schema.len();
    for row in &dataset.x {
        if row.len() != d {
            return Err(format!(
                "Inconsistent row length {} (schema has {d} features)",
                row.len()
            ));
        }
    }
    for &label in &dataset.y {
        if label >= n_classes {
            return Err(format!("Label {label} out of range for {n_classes} classes"));
        }
    }

    let n = dataset.x.len();
    let bins = options.bins.clamp(2, 256);
    let (mins, maxs) = compute_feature_min_max(&dataset.x, d);
    let binned = bin_features(&dataset.x, &mins, &maxs, bins);
    let features_per_split = ((d as f64).sqrt().round() as usize).clamp(1, d);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.trees);
    for _ in 0..options.trees {
        let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
        let context = GrowContext {
            binned: &binned,
            x: &dataset.x,
            y: &dataset.y,
            mins: &mins,
            maxs: &maxs,
            bins,
            n_classes,
            max_depth: options.max_depth,
            min_leaf: options.min_leaf.max(1),
            features_per_split,
        };
        trees.push(grow_tree(&context, &rows, 0, &mut rng));
    }

    Ok(ForestModel {
        model_version: MODEL_VERSION,
        schema: dataset.schema.clone(),
        classes: dataset.classes.clone(),
        provenance: dataset.provenance,
        seed: options.seed,
        trees,
    })
}

struct GrowContext<'a> {
    binned: &'a [Vec<u8>],
    x: &'a [Vec<f32>],
    y: &'a [usize],
    mins: &'a [f32],
    maxs: &'a [f32],
    bins: usize,
    n_classes: usize,
    max_depth: usize,
    min_leaf: usize,
    features_per_split: usize,
}

fn grow_tree(ctx: &GrowContext<'_>, rows: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
    let counts = class_counts(ctx.y, rows, ctx.n_classes);
    let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    if is_pure || depth >= ctx.max_depth || rows.len() < 2 * ctx.min_leaf {
        return TreeNode::Leaf {
            class_counts: counts,
        };
    }

    let mut candidates: Vec<usize> = (0..ctx.mins.len()).collect();
    candidates.shuffle(rng);
    candidates.truncate(ctx.features_per_split);

    let mut best = BestSplit::default();
    for &feature_idx in &candidates {
        let split = best_split_for_feature(ctx, rows, feature_idx);
        if split.score < best.score {
            best = split;
        }
    }
    if !best.score.is_finite() {
        return TreeNode::Leaf {
            class_counts: counts,
        };
    }

    let feature_idx = best.feature_index;
    let threshold =
        threshold_for_bin(ctx.mins[feature_idx], ctx.maxs[feature_idx], best.split_bin, ctx.bins);
    let (left_rows, right_rows) = partition_rows(ctx.x, rows, feature_idx, threshold);
    if left_rows.len() < ctx.min_leaf || right_rows.len() < ctx.min_leaf {
        return TreeNode::Leaf {
            class_counts: counts,
        };
    }

    TreeNode::Split {
        feature_index: feature_idx as u16,
        threshold,
        left: Box::new(grow_tree(ctx, &left_rows, depth + 1, rng)),
        right: Box::new(grow_tree(ctx, &right_rows, depth + 1, rng)),
    }
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_classes];
    for &row in rows {
        counts[y[row]] += 1;
    }
    counts
}

fn partition_rows(
    x: &[Vec<f32>],
    rows: &[usize],
    feature_idx: usize,
    threshold: f32,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &row in rows {
        let value = x[row].get(feature_idx).copied().unwrap_or(0.0);
        if value <= threshold {
            left.push(row);
        } else {
            right.push(row);
        }
    }
    (left, right)
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
}

impl Default for BestSplit {
    fn default() -> Self {
        Self {
            score: f64::INFINITY,
            feature_index: 0,
            split_bin: 0,
        }
    }
}

fn best_split_for_feature(ctx: &GrowContext<'_>, rows: &[usize], feature_idx: usize) -> BestSplit {
    let n_classes = ctx.n_classes;
    let mut counts = vec![0u32; ctx.bins * n_classes];
    for &row in rows {
        let b = ctx.binned[row].get(feature_idx).copied().unwrap_or(0) as usize;
        counts[b * n_classes + ctx.y[row]] += 1;
    }
    let mut total = vec![0u32; n_classes];
    for b in 0..ctx.bins {
        for k in 0..n_classes {
            total[k] += counts[b * n_classes + k];
        }
    }
    let total_count: u32 = total.iter().sum();
    if total_count == 0 {
        return BestSplit::default();
    }

    let mut best_score = f64::INFINITY;
    let mut best_bin = 0usize;
    let mut left = vec![0u32; n_classes];

    for split_bin in 0..(ctx.bins - 1) {
        for k in 0..n_classes {
            left[k] += counts[split_bin * n_classes + k];
        }
        let left_count: u32 = left.iter().sum();
        let right_count = total_count - left_count;
        if left_count == 0 || right_count == 0 {
            continue;
        }
        let mut left_gini = 1.0f64;
        let mut right_gini = 1.0f64;
        for k in 0..n_classes {
            let lp = left[k] as f64 / left_count as f64;
            let rp = (total[k] - left[k]) as f64 / right_count as f64;
            left_gini -= lp * lp;
            right_gini -= rp * rp;
        }
        let score = (left_count as f64 * left_gini + right_count as f64 * right_gini)
            / total_count as f64;
        if score < best_score {
            best_score = score;
            best_bin = split_bin;
        }
    }

    BestSplit {
        score: best_score,
        feature_index: feature_idx,
        split_bin: best_bin,
    }
}

fn compute_feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &v) in row.iter().take(feature_len).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..feature_len {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f32>], mins: &[f32], maxs: &[f32], bins: usize) -> Vec<Vec<u8>> {
    let bins = bins as f32;
    let mut out: Vec<Vec<u8>> = Vec::with_capacity(x.len());
    for row in x {
        let mut binned = Vec::with_capacity(mins.len());
        for (j, &min) in mins.iter().enumerate() {
            let max = maxs[j];
            let v = row.get(j).copied().unwrap_or(0.0);
            let t = if max > min {
                ((v - min) / (max - min)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let b = (t * (bins - 1.0)).round() as u8;
            binned.push(b);
        }
        out.push(binned);
    }
    out
}

fn threshold_for_bin(min: f32, max: f32, split_bin: usize, bins: usize) -> f32 {
    let bins_f = bins as f32;
    let t = ((split_bin + 1) as f32) / bins_f;
    min + t * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CLASS_NAMES;

    fn schema(width: usize) -> FeatureSchema {
        FeatureSchema {
            feature_names: (0..width).map(|i| format!("f{i}")).collect(),
        }
    }

    fn separable_dataset() -> TrainDataset {
        // Class is fully determined by either feature.
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let offset = (i % 10) as f32 * 0.01;
            if i % 2 == 0 {
                x.push(vec![offset, 1.0 + offset]);
                y.push(0);
            } else {
                x.push(vec![10.0 + offset, 11.0 + offset]);
                y.push(1);
            }
        }
        TrainDataset {
            schema: schema(2),
            classes: CLASS_NAMES.iter().map(|name| name.to_string()).collect(),
            provenance: DataProvenance::SyntheticFallback,
            x,
            y,
        }
    }

    #[test]
    fn learns_a_separable_problem() {
        let dataset = separable_dataset();
        let options = TrainOptions {
            trees: 10,
            ..TrainOptions::default()
        };
        let model = train_forest(&dataset, &options).unwrap();
        model.validate().unwrap();
        for (row, &truth) in dataset.x.iter().zip(dataset.y.iter()) {
            assert_eq!(model.predict_class_index(row), truth);
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let dataset = separable_dataset();
        let model = train_forest(&dataset, &TrainOptions::default()).unwrap();
        for row in &dataset.x {
            let probs = model.predict_proba(row);
            assert_eq!(probs.len(), 2);
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn training_is_deterministic_for_fixed_seed() {
        let dataset = separable_dataset();
        let options = TrainOptions {
            trees: 5,
            ..TrainOptions::default()
        };
        let a = train_forest(&dataset, &options).unwrap();
        let b = train_forest(&dataset, &options).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let mut dataset = separable_dataset();
        dataset.y.pop();
        assert!(train_forest(&dataset, &TrainOptions::default()).is_err());
    }

    #[test]
    fn rejects_rows_wider_than_schema() {
        let mut dataset = separable_dataset();
        dataset.x[0].push(1.0);
        assert!(train_forest(&dataset, &TrainOptions::default()).is_err());
    }

    #[test]
    fn rejects_out_of_range_label() {
        let mut dataset = separable_dataset();
        dataset.y[0] = 5;
        assert!(train_forest(&dataset, &TrainOptions::default()).is_err());
    }
}
