//! HTTP prediction service.
//!
//! Endpoints:
//!
//! - `GET /` - Slider form page
//! - `GET /health` - Health check
//! - `POST /predict` - Classify one feature vector
//!
//! The model is loaded once at startup and shared read-only across
//! requests. When no artifact exists the form is disabled and `/predict`
//! answers 503 with the operator-facing reason; there is no partial
//! functionality.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::ml::forest::ForestModel;
use crate::schema;

mod page;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded model, absent when the artifact is missing.
    model: Option<Arc<ForestModel>>,
    /// User-facing explanation shown when no model is loaded.
    unavailable_reason: Option<String>,
}

impl AppState {
    /// State with a loaded model; the prediction form is enabled.
    pub fn with_model(model: ForestModel) -> Self {
        Self {
            model: Some(Arc::new(model)),
            unavailable_reason: None,
        }
    }

    /// State without a model. `reason` is surfaced on the form page and in
    /// prediction errors until the operator runs the trainer and restarts.
    pub fn without_model(reason: String) -> Self {
        Self {
            model: None,
            unavailable_reason: Some(reason),
        }
    }

    pub fn model(&self) -> Option<&Arc<ForestModel>> {
        self.model.as_ref()
    }

    fn unavailable_reason(&self) -> String {
        self.unavailable_reason
            .clone()
            .unwrap_or_else(|| "No model loaded".to_string())
    }
}

/// One feature vector, keyed by the exact column names of the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "fixed acidity")]
    pub fixed_acidity: f32,
    #[serde(rename = "volatile acidity")]
    pub volatile_acidity: f32,
    #[serde(rename = "citric acid")]
    pub citric_acid: f32,
    #[serde(rename = "residual sugar")]
    pub residual_sugar: f32,
    pub chlorides: f32,
    #[serde(rename = "free sulfur dioxide")]
    pub free_sulfur_dioxide: f32,
    #[serde(rename = "total sulfur dioxide")]
    pub total_sulfur_dioxide: f32,
    pub density: f32,
    #[serde(rename = "pH")]
    pub ph: f32,
    pub sulphates: f32,
    pub alcohol: f32,
}

impl PredictRequest {
    /// Assemble the ordered feature row the model expects.
    pub fn to_row(&self) -> Vec<f32> {
        vec![
            self.fixed_acidity,
            self.volatile_acidity,
            self.citric_acid,
            self.residual_sugar,
            self.chlorides,
            self.free_sulfur_dioxide,
            self.total_sulfur_dioxide,
            self.density,
            self.ph,
            self.sulphates,
            self.alcohol,
        ]
    }

    /// Request with every field at its slider default.
    pub fn defaults() -> Self {
        let row = schema::default_row();
        Self {
            fixed_acidity: row[0],
            volatile_acidity: row[1],
            citric_acid: row[2],
            residual_sugar: row[3],
            chlorides: row[4],
            free_sulfur_dioxide: row[5],
            total_sulfur_dioxide: row[6],
            density: row[7],
            ph: row[8],
            sulphates: row[9],
            alcohol: row[10],
        }
    }
}

/// Prediction response: label plus the class probability distribution.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted class index (0 = average/low, 1 = good).
    pub label: usize,
    /// Human-readable class name.
    pub label_text: String,
    /// Per-class probabilities, summing to 1.
    pub probabilities: Vec<f32>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        model_loaded: state.model().is_some(),
    })
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(model) = state.model() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: state.unavailable_reason(),
            }),
        ));
    };

    let row = request.to_row();
    let probabilities = model.predict_proba(&row);
    let label = probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let label_text = model
        .classes
        .get(label)
        .cloned()
        .unwrap_or_else(|| label.to_string());
    tracing::debug!(label, "prediction served");

    Ok(Json(PredictionResponse {
        label,
        label_text,
        probabilities,
    }))
}
