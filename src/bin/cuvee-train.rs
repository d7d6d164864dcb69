//! Trains and exports the wine-quality classifier.

use std::path::PathBuf;

use cuvee::artifact;
use cuvee::dataset::{DataProvenance, RawDataset, fetch, split, synthetic};
use cuvee::logging;
use cuvee::ml::forest::{ForestModel, TrainDataset, TrainOptions, train_forest};
use cuvee::ml::metrics::{ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class};
use cuvee::schema::{CLASS_NAMES, FeatureSchema};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    logging::init("cuvee-train").map_err(|err| err.to_string())?;

    let (raw, provenance) = acquire_dataset(&options);
    tracing::info!(
        rows = raw.len(),
        source = provenance.describe(),
        "dataset ready"
    );

    let labels = raw.labels();
    let (train_idx, test_idx) =
        split::split_indices(raw.len(), split::TEST_FRACTION, options.seed);
    let train = TrainDataset {
        schema: FeatureSchema::current(),
        classes: CLASS_NAMES.iter().map(|name| name.to_string()).collect(),
        provenance,
        x: split::take_rows(&raw.x, &train_idx),
        y: split::take_rows(&labels, &train_idx),
    };

    let train_options = TrainOptions {
        trees: options.trees,
        max_depth: options.max_depth,
        seed: options.seed,
        ..TrainOptions::default()
    };
    tracing::info!(
        trees = train_options.trees,
        seed = train_options.seed,
        train_rows = train.x.len(),
        test_rows = test_idx.len(),
        "training forest"
    );
    let model = train_forest(&train, &train_options)?;

    let test_x = split::take_rows(&raw.x, &test_idx);
    let test_y = split::take_rows(&labels, &test_idx);
    let (acc, cm, per_class) = evaluate(&model, &test_x, &test_y);
    println!("test accuracy: {:.4}", acc);
    for (idx, stats) in per_class.iter().enumerate() {
        println!(
            "class {:>2} {:<20}  precision={:.3}  recall={:.3}  support={}",
            idx, model.classes[idx], stats.precision, stats.recall, stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in 0..cm.n_classes {
        let mut row = String::new();
        for pred in 0..cm.n_classes {
            row.push_str(&format!("{:6}", cm.get(truth, pred)));
        }
        println!("{row}");
    }

    artifact::save(&options.model_out, &model).map_err(|err| err.to_string())?;
    println!("Model saved: {}", options.model_out.display());

    Ok(())
}

fn acquire_dataset(options: &CliOptions) -> (RawDataset, DataProvenance) {
    if options.synthetic {
        tracing::warn!("--synthetic set; training on synthetic fallback data");
        return (
            synthetic::generate(synthetic::FALLBACK_ROWS, options.seed),
            DataProvenance::SyntheticFallback,
        );
    }
    tracing::info!(url = options.url.as_str(), "fetching dataset");
    match fetch::fetch_dataset(&options.url) {
        Ok(raw) => (raw, DataProvenance::Remote),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "dataset fetch failed; falling back to synthetic data"
            );
            (
                synthetic::generate(synthetic::FALLBACK_ROWS, options.seed),
                DataProvenance::SyntheticFallback,
            )
        }
    }
}

fn evaluate(
    model: &ForestModel,
    x: &[Vec<f32>],
    y: &[usize],
) -> (f32, ConfusionMatrix, Vec<PerClassStats>) {
    let mut cm = ConfusionMatrix::new(model.classes.len());
    for (row, &truth) in x.iter().zip(y.iter()) {
        cm.add(truth, model.predict_class_index(row));
    }
    let acc = accuracy(&cm);
    let per_class = precision_recall_by_class(&cm);
    (acc, cm, per_class)
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_out: PathBuf,
    url: String,
    seed: u64,
    trees: usize,
    max_depth: usize,
    synthetic: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model_out = artifact::default_path();
    let mut url = fetch::DEFAULT_DATASET_URL.to_string();
    let mut seed = 42u64;
    let mut trees = 100usize;
    let mut max_depth = 12usize;
    let mut synthetic = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                model_out = PathBuf::from(value);
            }
            "--url" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--url requires a value".to_string())?;
                url = value.clone();
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                trees = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --trees value: {value}"))?;
            }
            "--max-depth" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-depth requires a value".to_string())?;
                max_depth = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --max-depth value: {value}"))?;
            }
            "--synthetic" => {
                synthetic = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        model_out,
        url,
        seed,
        trees,
        max_depth,
        synthetic,
    })
}

fn help_text() -> String {
    [
        "cuvee-train",
        "",
        "Trains a random-forest wine-quality classifier and saves it as a JSON artifact.",
        "When the remote dataset cannot be fetched, training falls back to synthetic",
        "random data so the pipeline stays runnable offline.",
        "",
        "Usage:",
        "  cuvee-train [options]",
        "",
        "Options:",
        "  --out <file>       Output artifact path (default: model.json next to the executable).",
        "  --url <url>        Dataset URL (default: UCI red-wine quality table).",
        "  --seed <u64>       RNG seed for the split and the forest (default: 42).",
        "  --trees <n>        Number of trees (default: 100).",
        "  --max-depth <n>    Maximum tree depth (default: 12).",
        "  --synthetic        Skip the fetch and train on synthetic fallback data.",
    ]
    .join("\n")
}
