//! InferenceClient - sends encoded frames to the classification endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::types::{PredictRequest, PredictResponse, PredictionResult};
use crate::encoder::EncodedFrame;

/// Environment variable overriding the endpoint base URL.
pub const ENDPOINT_ENV: &str = "GESTURE_SENSE_ENDPOINT";

/// Default base URL of the classification service.
pub const DEFAULT_BASE_URL: &str = "https://gesture-sense-backend-production.up.railway.app";

/// Path of the classification route, relative to the base URL.
pub const PREDICT_PATH: &str = "/predict";

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Errors returned by a classification round trip.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// The endpoint answered with a well-formed `{"error": ...}` body.
    #[error("Server error: {detail}")]
    Server { detail: String },
}

impl InferenceError {
    /// Transport-level failure: no usable response came back.
    pub fn is_network(&self) -> bool {
        !matches!(self, InferenceError::Server { .. })
    }
}

/// A classifier the polling loop can submit frames to.
pub trait Classifier: Send + Sync {
    /// Classify one frame. Exactly one request per call; no retries.
    fn classify(
        &self,
        frame: EncodedFrame,
    ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send;
}

impl<T: Classifier> Classifier for Arc<T> {
    fn classify(
        &self,
        frame: EncodedFrame,
    ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send {
        (**self).classify(frame)
    }
}

/// HTTP client for the `/predict` endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    timeout: Option<Duration>,
    http_client: reqwest::Client,
}

impl InferenceClient {
    /// Create a client with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, InferenceError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client, optionally bounding each request's total duration.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, InferenceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http_client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn predict_url(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }

    /// Submit one frame for classification.
    ///
    /// # Errors
    ///
    /// `InferenceError::Http` if the request cannot be completed,
    /// `InferenceError::Status` for a non-2xx response,
    /// `InferenceError::MalformedBody` if a 2xx body is not the expected JSON,
    /// and `InferenceError::Server` if the body carries an `error` field.
    pub async fn submit(&self, frame: EncodedFrame) -> Result<PredictionResult, InferenceError> {
        let data_url = frame.to_data_url();

        let response = self
            .http_client
            .post(self.predict_url())
            .json(&PredictRequest { image: &data_url })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        parse_prediction(&body)
    }
}

impl Classifier for InferenceClient {
    fn classify(
        &self,
        frame: EncodedFrame,
    ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send {
        self.submit(frame)
    }
}

/// Interpret a 2xx response body.
pub fn parse_prediction(body: &str) -> Result<PredictionResult, InferenceError> {
    let parsed: PredictResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedBody(e.to_string()))?;

    if let Some(detail) = parsed.error {
        return Err(InferenceError::Server { detail });
    }

    Ok(PredictionResult {
        label: parsed.label,
        confidence: parsed.confidence.unwrap_or(0.0) as f32,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
