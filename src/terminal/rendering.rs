//! Rendering functions for the dashboard.
//!
//! Pure rendering logic separated from terminal lifecycle management. All
//! functions operate on ratatui Frame objects without managing terminal
//! state.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use super::status_bar::format_stats;
use super::StatusBar;
use crate::display::{ConfidenceTier, DisplayState, Indicator, LabelColor};
use crate::polling::Snapshot;

pub fn label_color(color: LabelColor) -> Color {
    match color {
        LabelColor::Neutral => Color::Gray,
        LabelColor::Tier(ConfidenceTier::Success) => Color::Green,
        LabelColor::Tier(ConfidenceTier::Warning) => Color::Yellow,
        LabelColor::Tier(ConfidenceTier::Alert) => Color::Red,
    }
}

fn indicator_span(indicator: Indicator) -> Span<'static> {
    match indicator {
        Indicator::Active => Span::styled("●", Style::default().fg(Color::Green)),
        Indicator::Inactive => Span::styled("○", Style::default().fg(Color::DarkGray)),
    }
}

/// Render the prediction panel: label, confidence meter, status line.
pub fn render_prediction(frame: &mut ratatui::Frame, state: &DisplayState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" gesture-sense ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [label_area, meter_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let color = label_color(state.label_color);

    // Vertically center the label in whatever room is left
    let label_row = Rect {
        y: label_area.y + label_area.height.saturating_sub(1) / 2,
        height: label_area.height.min(1),
        ..label_area
    };
    let label = Paragraph::new(state.label.as_str())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
    frame.render_widget(label, label_row);

    let ratio = f64::from(state.meter_percent / 100.0).clamp(0.0, 1.0);
    let meter = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(ratio)
        .label(state.meter_text.as_str());
    frame.render_widget(meter, meter_area);

    let status = Line::from(vec![
        indicator_span(state.indicator),
        Span::raw(" "),
        Span::raw(state.status.as_str()),
    ]);
    frame.render_widget(Paragraph::new(status), status_area);
}

/// Render the status bar on the bottom row of `area`.
pub fn render_status_bar(
    frame: &mut ratatui::Frame,
    status_bar: &StatusBar,
    snapshot: &Snapshot,
    area: Rect,
) {
    let status_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1.min(area.height),
    };
    let status_paragraph = Paragraph::new(status_bar.format(snapshot))
        .style(Style::default().fg(Color::Black).bg(Color::White));
    frame.render_widget(status_paragraph, status_area);
}

/// Render a complete dashboard frame.
///
/// Layout, top to bottom: prediction panel, stats line, status bar.
pub fn render_dashboard(
    frame: &mut ratatui::Frame,
    snapshot: &Snapshot,
    status_bar: &StatusBar,
    area: Rect,
) {
    let [panel_area, stats_area, bar_area] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_prediction(frame, &snapshot.display, panel_area);

    let stats = Paragraph::new(format_stats(snapshot)).style(Style::default().fg(Color::Gray));
    frame.render_widget(stats, stats_area);

    render_status_bar(frame, status_bar, snapshot, bar_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{next_state, Signal};
    use crate::inference::PredictionResult;
    use crate::polling::{Cadence, LoopState};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(snapshot: &Snapshot) -> String {
        let backend = TestBackend::new(70, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let bar = StatusBar::new("http://localhost:8000", Cadence::Serial);
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, snapshot, &bar, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_label_colors() {
        assert_eq!(label_color(LabelColor::Neutral), Color::Gray);
        assert_eq!(
            label_color(LabelColor::Tier(ConfidenceTier::Success)),
            Color::Green
        );
        assert_eq!(
            label_color(LabelColor::Tier(ConfidenceTier::Warning)),
            Color::Yellow
        );
        assert_eq!(
            label_color(LabelColor::Tier(ConfidenceTier::Alert)),
            Color::Red
        );
    }

    #[test]
    fn test_dashboard_waiting_state() {
        let text = render(&Snapshot::default());
        assert!(text.contains("gesture-sense"));
        assert!(text.contains("Waiting for hand..."));
        assert!(text.contains("0%"));
        assert!(text.contains("FPS: --"));
        assert!(text.contains("space:pause"));
    }

    #[test]
    fn test_dashboard_shows_prediction() {
        let display = next_state(
            &DisplayState::waiting(),
            &Signal::Prediction(PredictionResult::new("Peace", 0.9)),
        );
        let snapshot = Snapshot {
            display,
            fps: Some(5),
            loop_state: LoopState::Active,
            ..Snapshot::default()
        };
        let text = render(&snapshot);
        assert!(text.contains("Peace"));
        assert!(text.contains("90.0%"));
        assert!(text.contains("Hand detected - Predicting..."));
        assert!(text.contains("FPS: 5"));
        assert!(text.contains("●"));
    }

    #[test]
    fn test_dashboard_tiny_terminal_does_not_panic() {
        let backend = TestBackend::new(10, 2);
        let mut terminal = Terminal::new(backend).unwrap();
        let bar = StatusBar::new("http://x", Cadence::Serial);
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, &Snapshot::default(), &bar, area);
            })
            .unwrap();
    }
}
