//! Detected item produced by an image scan
//!
//! Items live for the duration of one scan request and are never persisted.

use serde::{Deserialize, Serialize};

/// One normalized detection returned by the vision model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    /// Trimmed, lower-case label
    pub label: String,

    /// Number of units seen, at least 1
    pub count: u32,

    /// Model confidence in `[0, 1]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DetectedItem {
    pub fn new(label: impl Into<String>, count: u32) -> Self {
        Self {
            label: label.into(),
            count,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
