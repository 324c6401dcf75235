//! Wire and history types for the demo

use chrono::{DateTime, Utc};
use digitsight_core::DigitScores;
use serde::Serialize;

/// One classified upload, kept in the bounded history ring buffer and
/// returned by `/api/classify` and `/api/history`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    /// Unique record id
    pub id: String,

    /// When the image was classified
    pub timestamp: DateTime<Utc>,

    /// Original filename of the upload, if the browser sent one
    pub filename: Option<String>,

    /// Top-1 label
    pub label: String,

    /// Top-1 probability
    pub score: f32,

    /// Full label -> probability mapping
    pub predictions: DigitScores,

    /// Forward-pass latency in microseconds
    pub latency_us: u64,
}

impl PredictionRecord {
    pub fn new(
        filename: Option<String>,
        result: &digitsight_classifier::Classification,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            filename,
            label: result.label.clone(),
            score: result.score,
            predictions: result.scores.clone(),
            latency_us: result.latency_us,
        }
    }
}
