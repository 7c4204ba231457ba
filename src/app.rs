//! Wiring: camera, encoder, inference client, polling loop, and a surface
//! (dashboard or headless printer).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::camera::{CameraError, CameraSource};
use crate::config::{ConfigError, Settings};
use crate::encoder::{EncodeError, FrameEncoder};
use crate::event_loop;
use crate::inference::{InferenceClient, InferenceError};
use crate::polling::{LoopCommand, PollingLoop, Snapshot};
use crate::terminal::{format_fps, StatusBar, Tui};

/// Errors that end the program.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Encoder error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Failed to read image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Global flag for Ctrl+C detection in headless mode
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// How often headless mode checks for Ctrl+C.
const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up Ctrl+C handler for graceful shutdown
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
    })
}

/// One line of headless output.
///
/// Format: "[active] Peace 92.0% | Hand detected - Predicting... | fps 5"
pub fn format_headless_line(snapshot: &Snapshot) -> String {
    let display = &snapshot.display;
    format!(
        "[{}] {} {} | {} | fps {}",
        snapshot.loop_state.name(),
        display.label,
        display.meter_text,
        display.status,
        format_fps(snapshot.fps),
    )
}

/// Run the live pipeline until the user quits.
pub async fn run(settings: Settings) -> Result<(), AppError> {
    let client = InferenceClient::with_timeout(&settings.endpoint_url, settings.request_timeout)?;
    let encoder = FrameEncoder::new(settings.geometry, settings.quality)?;
    let source = Arc::new(CameraSource::new());

    log::info!(
        "Starting: endpoint={} cadence={} interval={}ms camera={}",
        client.predict_url(),
        settings.polling.cadence.name(),
        settings.polling.interval.as_millis(),
        settings.constraints.device_index,
    );

    let polling = PollingLoop::new(Arc::clone(&source), encoder, client, settings.polling.clone());
    let snapshots = polling.subscribe();
    let (command_tx, command_rx) = mpsc::channel(8);
    let loop_handle = tokio::spawn(polling.run(command_rx));

    // Opening a camera blocks (and may wait on an OS permission prompt)
    let acquire_source = Arc::clone(&source);
    let constraints = settings.constraints.clone();
    let acquisition = tokio::task::spawn_blocking(move || {
        // The outcome reaches the display through the source's status
        let _ = acquire_source.acquire(constraints);
    });

    let surface = if settings.headless {
        run_headless(snapshots).await
    } else {
        let status_bar = StatusBar::new(&settings.endpoint_url, settings.polling.cadence);
        run_dashboard(snapshots, &command_tx, &status_bar).await
    };

    // Shut down even if the surface failed
    let _ = command_tx.send(LoopCommand::Shutdown).await;
    drop(command_tx);
    loop_handle.await?;
    if acquisition.is_finished() {
        acquisition.await?;
    } else {
        // Still blocked opening the device (e.g. on a permission prompt)
        log::warn!("Camera still opening at shutdown; not waiting for it");
    }
    tokio::task::spawn_blocking(move || source.release()).await?;
    log::info!("Stopped");

    surface
}

async fn run_dashboard(
    snapshots: watch::Receiver<Snapshot>,
    commands: &mpsc::Sender<LoopCommand>,
    status_bar: &StatusBar,
) -> Result<(), AppError> {
    let mut tui = Tui::new()?;
    let result = event_loop::run(&mut tui, snapshots, commands, status_bar).await;
    tui.restore()?;
    result
}

/// Print a line whenever the visible state changes, until Ctrl+C.
async fn run_headless(mut snapshots: watch::Receiver<Snapshot>) -> Result<(), AppError> {
    setup_ctrlc_handler()?;
    println!("Press Ctrl+C to stop.");

    let mut signal_check = tokio::time::interval(SIGNAL_POLL_INTERVAL);
    let mut last_line = String::new();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = format_headless_line(&snapshots.borrow_and_update());
                if line != last_line {
                    println!("{}", line);
                    last_line = line;
                }
            }
            _ = signal_check.tick() => {
                if ctrlc_received() {
                    println!();
                    break;
                }
            }
        }
    }
    Ok(())
}
