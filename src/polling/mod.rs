//! Polling loop: the cadence that drives capture, submission and display.
//!
//! The loop is `Idle` while the camera is not ready, `Active` once it is, and
//! `Stopped` only when paused by the user. It never stops on a failed round
//! trip.

mod backoff;
mod runner;

use std::time::Duration;

use serde::Deserialize;

use crate::display::DisplayState;

pub use backoff::{calculate_backoff, FailureBackoff, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX};
pub use runner::PollingLoop;

/// Default time between ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// Default cap on concurrent submissions in fixed-rate mode.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// How ticks are scheduled relative to in-flight requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cadence {
    /// Wait for each result, then sleep one interval before the next tick.
    #[default]
    Serial,
    /// Tick on a fixed period; requests may overlap and finish out of order.
    FixedRate,
}

impl Cadence {
    pub fn name(&self) -> &'static str {
        match self {
            Cadence::Serial => "serial",
            Cadence::FixedRate => "fixed-rate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
    pub cadence: Cadence,
    /// Only used in fixed-rate mode; at least 1
    pub max_in_flight: usize,
    /// Extend the re-arm delay after consecutive failures
    pub backoff: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            cadence: Cadence::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            backoff: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Active,
    Stopped,
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::Active => "active",
            LoopState::Stopped => "paused",
        }
    }
}

/// Control messages accepted by [`PollingLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    Pause,
    Resume,
    Shutdown,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused; nothing attempted
    Stopped,
    /// Camera not ready; no capture attempted
    Idle,
    /// Camera ready but no decodable frame yet
    NoFrame,
    /// Too many requests in flight; tick skipped
    Saturated,
    /// Frame handed to a background submission (fixed-rate mode)
    Submitted { sequence: u64 },
    /// Round trip returned a prediction
    Completed { sequence: u64, displayed: bool },
    /// Round trip failed
    Failed {
        sequence: u64,
        network: bool,
        displayed: bool,
    },
}

/// Everything a surface needs to draw one frame of UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub display: DisplayState,
    /// Round trips per second over the last whole window
    pub fps: Option<u32>,
    pub loop_state: LoopState,
    pub last_latency: Option<Duration>,
    pub in_flight: usize,
    pub submitted: u64,
    pub failed: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            display: DisplayState::waiting(),
            fps: None,
            loop_state: LoopState::Idle,
            last_latency: None,
            in_flight: 0,
            submitted: 0,
            failed: 0,
        }
    }
}
