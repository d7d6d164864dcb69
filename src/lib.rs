//! Library exports for reuse in the binaries, benchmarks, and tests.

/// Crate version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model artifact persistence (save/load, path resolution).
pub mod artifact;
/// Dataset acquisition, fallback generation, and splitting.
pub mod dataset;
/// Shared HTTP client configuration.
pub mod http_client;
/// Logging setup for the binaries.
pub mod logging;
/// Machine learning helpers for training and inference.
pub mod ml;
/// Feature schema shared between training and inference.
pub mod schema;
/// HTTP prediction service.
pub mod serve;
