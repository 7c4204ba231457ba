//! Terminal management: TUI lifecycle, dashboard rendering, and status bar.

mod rendering;
mod status_bar;
mod tui;

pub use rendering::{label_color, render_dashboard};
pub use status_bar::{format_fps, format_latency, format_stats, StatusBar};
pub use tui::Tui;
