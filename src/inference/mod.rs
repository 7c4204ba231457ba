//! Inference client for the remote hand-gesture classifier.
//!
//! Frames are posted as JPEG data URLs to `POST {base}/predict`; the response
//! is either a prediction, an application-level `error`, or a transport
//! failure.

mod client;
mod types;

pub use client::{
    parse_prediction, Classifier, InferenceClient, InferenceError, DEFAULT_BASE_URL,
    ENDPOINT_ENV, PREDICT_PATH,
};
pub use types::PredictionResult;
