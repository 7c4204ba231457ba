//! Wire types for the `/predict` endpoint.

use serde::{Deserialize, Serialize};

/// One classification returned by the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: Option<String>,
    /// Classifier confidence, nominally in [0, 1]
    pub confidence: f32,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: Some(label.into()),
            confidence,
        }
    }

    /// The "nothing in frame" result.
    pub fn no_hand() -> Self {
        Self {
            label: None,
            confidence: 0.0,
        }
    }

    /// Whether this is an actual classification rather than "no hand".
    ///
    /// An empty label, a non-positive confidence or a NaN confidence all mean
    /// no hand was detected.
    pub fn is_hand(&self) -> bool {
        self.hand_label().is_some()
    }

    /// The label, if this result is an actual classification.
    pub fn hand_label(&self) -> Option<&str> {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() && self.confidence > 0.0 => Some(label),
            _ => None,
        }
    }
}

/// Request body: `{ "image": "<data URL>" }`.
#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest<'a> {
    pub image: &'a str,
}

/// Response body as the endpoint sends it.
#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Application-level failure detail
    #[serde(default)]
    pub error: Option<String>,
}
