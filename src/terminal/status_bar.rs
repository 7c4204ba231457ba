//! Status bar and stats line text for the dashboard.

use std::time::Duration;

use crate::polling::{Cadence, LoopState, Snapshot};

/// Bottom-row status bar.
///
/// Shows: loop state | cadence | endpoint | key hints
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub endpoint: String,
    pub cadence: Cadence,
}

impl StatusBar {
    pub fn new(endpoint: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            endpoint: endpoint.into(),
            cadence,
        }
    }

    /// Format: " active | serial | https://host | space:pause q:quit "
    pub fn format(&self, snapshot: &Snapshot) -> String {
        let toggle = if snapshot.loop_state == LoopState::Stopped {
            "space:resume"
        } else {
            "space:pause"
        };
        format!(
            " {} | {} | {} | {} q:quit ",
            snapshot.loop_state.name(),
            self.cadence.name(),
            self.endpoint,
            toggle,
        )
    }
}

/// Round-trip statistics shown under the meter.
pub fn format_stats(snapshot: &Snapshot) -> String {
    format!(
        "FPS: {}  Latency: {}  In flight: {}  Sent: {}  Failed: {}",
        format_fps(snapshot.fps),
        format_latency(snapshot.last_latency),
        snapshot.in_flight,
        snapshot.submitted,
        snapshot.failed,
    )
}

/// Published rate, or `--` before the first full window.
pub fn format_fps(fps: Option<u32>) -> String {
    fps.map_or_else(|| "--".to_string(), |fps| fps.to_string())
}

pub fn format_latency(latency: Option<Duration>) -> String {
    latency.map_or_else(|| "--".to_string(), |d| format!("{}ms", d.as_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bar_format() {
        let bar = StatusBar::new("http://localhost:8000", Cadence::Serial);
        let snapshot = Snapshot {
            loop_state: LoopState::Active,
            ..Snapshot::default()
        };
        assert_eq!(
            bar.format(&snapshot),
            " active | serial | http://localhost:8000 | space:pause q:quit "
        );
    }

    #[test]
    fn test_status_bar_paused_hint() {
        let bar = StatusBar::new("http://x", Cadence::FixedRate);
        let snapshot = Snapshot {
            loop_state: LoopState::Stopped,
            ..Snapshot::default()
        };
        let text = bar.format(&snapshot);
        assert!(text.contains("paused"));
        assert!(text.contains("fixed-rate"));
        assert!(text.contains("space:resume"));
    }

    #[test]
    fn test_format_stats_before_first_window() {
        let text = format_stats(&Snapshot::default());
        assert_eq!(
            text,
            "FPS: --  Latency: --  In flight: 0  Sent: 0  Failed: 0"
        );
    }

    #[test]
    fn test_format_stats_with_values() {
        let snapshot = Snapshot {
            fps: Some(5),
            last_latency: Some(Duration::from_millis(142)),
            in_flight: 1,
            submitted: 12,
            failed: 2,
            ..Snapshot::default()
        };
        assert_eq!(
            format_stats(&snapshot),
            "FPS: 5  Latency: 142ms  In flight: 1  Sent: 12  Failed: 2"
        );
    }
}
