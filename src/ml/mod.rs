//! Machine learning helpers for training and inference.
//!
//! These utilities are the building blocks used by the trainer binary and
//! the prediction service: a seeded random-forest classifier and the
//! evaluation metrics printed after training.

pub mod forest;
pub mod metrics;
