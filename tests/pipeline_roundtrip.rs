//! End-to-end pipeline tests: acquire rows, derive labels, split, train,
//! persist, reload, and predict — the same path the binaries take.

use cuvee::artifact;
use cuvee::dataset::{DataProvenance, split, synthetic};
use cuvee::ml::forest::{ForestModel, TrainDataset, TrainOptions, train_forest};
use cuvee::ml::metrics::{ConfusionMatrix, accuracy};
use cuvee::schema::{self, CLASS_NAMES, FeatureSchema};
use tempfile::tempdir;

fn train_on_fallback(seed: u64, trees: usize) -> (ForestModel, f32) {
    let raw = synthetic::generate(synthetic::FALLBACK_ROWS, seed);
    let labels = raw.labels();
    let (train_idx, test_idx) = split::split_indices(raw.len(), split::TEST_FRACTION, seed);

    let dataset = TrainDataset {
        schema: FeatureSchema::current(),
        classes: CLASS_NAMES.iter().map(|name| name.to_string()).collect(),
        provenance: DataProvenance::SyntheticFallback,
        x: split::take_rows(&raw.x, &train_idx),
        y: split::take_rows(&labels, &train_idx),
    };
    let options = TrainOptions {
        trees,
        seed,
        ..TrainOptions::default()
    };
    let model = train_forest(&dataset, &options).expect("training succeeds");

    let mut cm = ConfusionMatrix::new(model.classes.len());
    for (&idx, truth) in test_idx.iter().zip(split::take_rows(&labels, &test_idx)) {
        cm.add(truth, model.predict_class_index(&raw.x[idx]));
    }
    (model, accuracy(&cm))
}

#[test]
fn fallback_training_run_is_deterministic() {
    let (model_a, acc_a) = train_on_fallback(42, 25);
    let (model_b, acc_b) = train_on_fallback(42, 25);
    assert_eq!(acc_a, acc_b);
    assert_eq!(
        serde_json::to_string(&model_a).unwrap(),
        serde_json::to_string(&model_b).unwrap()
    );
}

#[test]
fn defaults_vector_gets_a_valid_prediction_from_fallback_model() {
    let (model, _) = train_on_fallback(42, 100);
    let row = schema::default_row();
    let probs = model.predict_proba(&row);
    let label = model.predict_class_index(&row);

    assert!(label <= 1);
    assert_eq!(probs.len(), 2);
    assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    assert_eq!(label, if probs[1] > probs[0] { 1 } else { 0 });
}

#[test]
fn persisted_model_round_trips_exact_predictions() {
    let (model, _) = train_on_fallback(42, 25);
    let dir = tempdir().unwrap();
    let path = dir.path().join(artifact::MODEL_FILE_NAME);
    artifact::save(&path, &model).unwrap();
    let loaded = artifact::load(&path).unwrap();

    assert_eq!(loaded.provenance, DataProvenance::SyntheticFallback);
    let mut sample_rows = vec![schema::default_row()];
    sample_rows.extend(synthetic::generate(10, 7).x);
    for row in &sample_rows {
        assert_eq!(model.predict_proba(row), loaded.predict_proba(row));
        assert_eq!(model.predict_class_index(row), loaded.predict_class_index(row));
    }
}

#[test]
fn retraining_overwrites_a_prior_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(artifact::MODEL_FILE_NAME);

    let (first, _) = train_on_fallback(1, 5);
    artifact::save(&path, &first).unwrap();
    let (second, _) = train_on_fallback(2, 5);
    artifact::save(&path, &second).unwrap();

    let loaded = artifact::load(&path).unwrap();
    assert_eq!(loaded.seed, 2);
    assert_eq!(
        serde_json::to_string(&loaded).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn probabilities_sum_to_one_across_the_slider_space() {
    let (model, _) = train_on_fallback(42, 25);
    // Corners of the advisory slider ranges plus the defaults.
    let mut rows = vec![
        schema::default_row(),
        schema::FIELDS.iter().map(|f| f.min).collect(),
        schema::FIELDS.iter().map(|f| f.max).collect(),
    ];
    rows.extend(synthetic::generate(25, 9).x);
    for row in &rows {
        let probs = model.predict_proba(row);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
