use crate::models::PredictionRecord;
use crate::state::DemoAppState;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

// ============================================================================
// Health
// ============================================================================

pub async fn health(State(state): State<DemoAppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.classifier.name(),
    }))
}

// ============================================================================
// Classification
// ============================================================================

/// `POST /api/classify` - classify an uploaded digit image and record
/// it in the history panel.
pub async fn classify(
    State(state): State<DemoAppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictionRecord>, (StatusCode, Json<serde_json::Value>)> {
    let bad_request =
        |msg: String| (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })));

    let (data, filename) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(format!("invalid multipart request: {e}")))?;
        match field {
            Some(field) => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read upload: {e}")))?;
                if !bytes.is_empty() {
                    break (bytes, filename);
                }
            }
            None => return Err(bad_request("no file provided in upload".to_string())),
        }
    };

    let image = digitsight_core::decode_image(&data)
        .map_err(|e| bad_request(e.to_string()))?;

    let result = state.classifier.classify(&image).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    debug!(label = %result.label, score = result.score, "demo classification");

    let record = PredictionRecord::new(filename, &result);
    state.add_record(record.clone());

    Ok(Json(record))
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn history(
    State(state): State<DemoAppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(20);
    Json(state.recent(limit))
}
