use crate::models::PredictionRecord;
use digitsight_classifier::DigitClassifier;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

const MAX_PREDICTION_HISTORY: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct DemoAppState {
    /// The loaded digit classifier, read-only for the process lifetime
    pub classifier: Arc<dyn DigitClassifier>,

    /// Recent predictions for the inspector panel, newest first
    pub history: Arc<RwLock<VecDeque<PredictionRecord>>>,
}

impl DemoAppState {
    pub fn new(classifier: Arc<dyn DigitClassifier>) -> Self {
        Self {
            classifier,
            history: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_PREDICTION_HISTORY))),
        }
    }

    /// Add a prediction record to history
    pub fn add_record(&self, record: PredictionRecord) {
        let mut history = self.history.write();
        history.push_front(record);
        if history.len() > MAX_PREDICTION_HISTORY {
            history.pop_back();
        }
    }

    /// Get recent prediction records, newest first
    pub fn recent(&self, limit: usize) -> Vec<PredictionRecord> {
        let history = self.history.read();
        history.iter().take(limit).cloned().collect()
    }
}
