//! Display controller: maps the latest signal onto a complete [`DisplayState`].
//!
//! [`next_state`] is the whole policy and is pure. [`DisplayController`] only
//! adds the current state and the sequence number of the last applied
//! result, so late responses from earlier submissions are dropped instead of
//! overwriting newer ones.

use crate::camera::CameraStatus;
use crate::inference::{InferenceError, PredictionResult};

/// Lower bound of the success tier.
pub const SUCCESS_THRESHOLD: f32 = 0.8;

/// Lower bound of the warning tier.
pub const WARNING_THRESHOLD: f32 = 0.6;

pub const NO_LABEL: &str = "-";
pub const STATUS_HAND: &str = "Hand detected - Predicting...";
pub const STATUS_WAITING: &str = "Waiting for hand...";
pub const STATUS_NETWORK_ERROR: &str = "Error connecting to server";
pub const STATUS_REQUESTING: &str = "Requesting camera access...";
pub const STATUS_DENIED: &str = "Camera access denied";
pub const STATUS_CAMERA_READY: &str = "Camera ready";
pub const STATUS_PAUSED: &str = "Paused";

/// Visual band of a confidence score, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceTier {
    Alert,
    Warning,
    Success,
}

impl ConfidenceTier {
    pub fn name(&self) -> &'static str {
        match self {
            ConfidenceTier::Alert => "alert",
            ConfidenceTier::Warning => "warning",
            ConfidenceTier::Success => "success",
        }
    }
}

/// Tier of a confidence score. Total: anything below the warning bound,
/// including NaN, is `Alert`.
pub fn tier(confidence: f32) -> ConfidenceTier {
    if confidence >= SUCCESS_THRESHOLD {
        ConfidenceTier::Success
    } else if confidence >= WARNING_THRESHOLD {
        ConfidenceTier::Warning
    } else {
        ConfidenceTier::Alert
    }
}

/// Color of the label and meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColor {
    Neutral,
    Tier(ConfidenceTier),
}

/// Binary status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Active,
    Inactive,
}

impl Indicator {
    pub fn is_active(&self) -> bool {
        matches!(self, Indicator::Active)
    }
}

/// A failed round trip, reduced to what the display needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No usable response (connect error, non-2xx, malformed body)
    Network(String),
    /// The endpoint reported an application error
    Server(String),
}

impl From<&InferenceError> for Failure {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::Server { detail } => Failure::Server(detail.clone()),
            other => Failure::Network(other.to_string()),
        }
    }
}

/// Everything the display can react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Prediction(PredictionResult),
    Failure(Failure),
    Camera(CameraStatus),
    Paused,
}

/// Every user-visible field, always replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub label: String,
    pub label_color: LabelColor,
    /// Meter fill in [0, 100]
    pub meter_percent: f32,
    pub meter_text: String,
    pub status: String,
    pub indicator: Indicator,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::waiting()
    }
}

impl DisplayState {
    /// The canonical "no hand" state, which is also the initial state.
    pub fn waiting() -> Self {
        Self::cleared(STATUS_WAITING, Indicator::Inactive)
    }

    fn cleared(status: impl Into<String>, indicator: Indicator) -> Self {
        Self {
            label: NO_LABEL.to_string(),
            label_color: LabelColor::Neutral,
            meter_percent: 0.0,
            meter_text: "0%".to_string(),
            status: status.into(),
            indicator,
        }
    }

    fn with_status(prev: &DisplayState, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            indicator: Indicator::Inactive,
            ..prev.clone()
        }
    }
}

/// The display policy.
pub fn next_state(prev: &DisplayState, signal: &Signal) -> DisplayState {
    match signal {
        Signal::Prediction(result) => match result.hand_label() {
            Some(label) => {
                let confidence = result.confidence.min(1.0);
                let percent = f64::from(confidence) * 100.0;
                DisplayState {
                    label: label.to_string(),
                    label_color: LabelColor::Tier(tier(confidence)),
                    meter_percent: percent as f32,
                    meter_text: format!("{:.1}%", percent),
                    status: STATUS_HAND.to_string(),
                    indicator: Indicator::Active,
                }
            }
            None => DisplayState::waiting(),
        },
        Signal::Failure(Failure::Network(_)) => DisplayState::with_status(prev, STATUS_NETWORK_ERROR),
        Signal::Failure(Failure::Server(detail)) => {
            DisplayState::with_status(prev, format!("Server error: {}", detail))
        }
        Signal::Camera(CameraStatus::Requesting) => {
            DisplayState::cleared(STATUS_REQUESTING, Indicator::Inactive)
        }
        Signal::Camera(CameraStatus::Ready) => {
            DisplayState::cleared(STATUS_CAMERA_READY, Indicator::Active)
        }
        Signal::Camera(CameraStatus::Denied(_)) => {
            DisplayState::cleared(STATUS_DENIED, Indicator::Inactive)
        }
        Signal::Camera(CameraStatus::Unavailable(reason)) => DisplayState::cleared(
            format!("Camera unavailable: {}", reason),
            Indicator::Inactive,
        ),
        Signal::Paused => DisplayState::with_status(prev, STATUS_PAUSED),
    }
}

/// Holds the current [`DisplayState`] and drops out-of-order results.
#[derive(Debug, Clone, Default)]
pub struct DisplayController {
    state: DisplayState,
    last_sequence: Option<u64>,
}

impl DisplayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Apply a signal that is not tied to a submission (camera, pause).
    pub fn apply(&mut self, signal: &Signal) -> &DisplayState {
        self.state = next_state(&self.state, signal);
        &self.state
    }

    /// Apply the outcome of submission `sequence`.
    ///
    /// Returns `false`, leaving the display untouched, if a result from the
    /// same or a later submission has already been applied.
    pub fn apply_result(&mut self, sequence: u64, signal: &Signal) -> bool {
        if self.last_sequence.is_some_and(|last| sequence <= last) {
            log::debug!(
                "Dropping stale result #{} (showing #{:?})",
                sequence,
                self.last_sequence
            );
            return false;
        }
        self.last_sequence = Some(sequence);
        self.state = next_state(&self.state, signal);
        true
    }
}
