//! HTTP routes and handlers

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::state::AppState;
use digitsight_core::{decode_image, DigitScores, Error};

pub fn create_router(state: AppState) -> Router {
    // Matches the original deployment: a single CORS-enabled app open
    // to all origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/infer/", post(infer))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(cors)
        .with_state(state)
}

/// Response body of `POST /infer/`
#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub predictions: DigitScores,
}

/// Error response with an explicit JSON shape. Decode and shape errors
/// are the caller's fault (400); everything else is ours (500).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        metrics::counter!(
            "digitsight_errors_total",
            "status" => self.status.as_u16().to_string()
        )
        .increment(1);
        warn!(status = %self.status, "request failed: {}", self.message);
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// `POST /infer/` - classify an uploaded digit image.
///
/// Accepts the first file-bearing multipart part, reads it fully into
/// memory, decodes it, and returns the label -> probability mapping.
async fn infer(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<InferResponse>, ApiError> {
    metrics::counter!("digitsight_requests_total").increment(1);

    let data = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("invalid multipart request: {e}")))?;
        match field {
            Some(field) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                if !bytes.is_empty() {
                    break bytes;
                }
            }
            None => return Err(ApiError::bad_request("no file provided in upload")),
        }
    };

    debug!(bytes = data.len(), "received upload");

    let image = decode_image(&data)?;
    let result = state.classifier.classify(&image).await?;

    metrics::histogram!("digitsight_inference_latency_us").record(result.latency_us as f64);
    debug!(
        label = %result.label,
        score = result.score,
        latency_us = result.latency_us,
        "classified digit"
    );

    Ok(Json(InferResponse {
        predictions: result.scores,
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.classifier.name(),
    }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
}
