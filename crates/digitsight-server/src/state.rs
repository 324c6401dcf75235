//! Shared application state

use digitsight_classifier::DigitClassifier;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State shared by all request handlers.
///
/// The classifier is a process-lifetime, read-only resource: loaded
/// once at startup and shared across concurrent requests without
/// locking.
#[derive(Clone)]
pub struct AppState {
    /// The loaded digit classifier
    pub classifier: Arc<dyn DigitClassifier>,

    /// Handle for rendering Prometheus metrics
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(classifier: Arc<dyn DigitClassifier>, metrics: PrometheusHandle) -> Self {
        Self {
            classifier,
            metrics,
        }
    }
}
