//! Serves wine-quality predictions over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use cuvee::artifact::{self, ArtifactError};
use cuvee::dataset::DataProvenance;
use cuvee::logging;
use cuvee::serve::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    logging::init("cuvee-serve").map_err(|err| err.to_string())?;

    let model_path = options
        .model_path
        .clone()
        .unwrap_or_else(artifact::default_path);
    let state = match artifact::load(&model_path) {
        Ok(model) => {
            if model.provenance == DataProvenance::SyntheticFallback {
                tracing::warn!("loaded model was trained on synthetic fallback data");
            }
            tracing::info!(
                path = %model_path.display(),
                trees = model.trees.len(),
                source = model.provenance.describe(),
                "model loaded"
            );
            AppState::with_model(model)
        }
        Err(err @ ArtifactError::Missing { .. }) => {
            // Startup still succeeds; the form stays disabled until the
            // operator trains a model and restarts.
            tracing::error!("{err}");
            AppState::without_model(err.to_string())
        }
        Err(err) => return Err(err.to_string()),
    };

    let addr: SocketAddr = options
        .addr
        .parse()
        .map_err(|_| format!("Invalid listen address: {}", options.addr))?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| format!("Failed to start async runtime: {err}"))?;
    runtime.block_on(serve(addr, state))
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<(), String> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("Failed to bind {addr}: {err}"))?;
    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|err| format!("Server error: {err}"))
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: Option<PathBuf>,
    addr: String,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model_path: Option<PathBuf> = None;
    let mut addr = DEFAULT_ADDR.to_string();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--addr" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--addr requires a value".to_string())?;
                addr = value.clone();
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions { model_path, addr })
}

fn help_text() -> String {
    [
        "cuvee-serve",
        "",
        "Serves the wine-quality prediction form and JSON endpoint over HTTP.",
        "The model artifact is loaded once at startup; run cuvee-train first.",
        "",
        "Usage:",
        "  cuvee-serve [options]",
        "",
        "Options:",
        "  --model <file>  Artifact path (default: model.json next to the executable).",
        "  --addr <addr>   Listen address (default: 127.0.0.1:8080).",
    ]
    .join("\n")
}
