//! Camera capture handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::run_capture_loop;
use super::device::list_devices;
use super::types::{CameraError, CaptureConstraints, Frame, Resolution};

/// Owns the device stream and the background thread reading it.
///
/// The thread keeps only the most recent frame; readers clone it out with
/// [`CameraCapture::latest_frame`]. Dropping the handle stops the thread and
/// releases the device.
pub struct CameraCapture {
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    capture_thread: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    constraints: CaptureConstraints,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("constraints", &self.constraints)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Validate that the requested device exists.
    ///
    /// The stream itself is opened on the capture thread by `start()`.
    ///
    /// # Errors
    /// * `CameraError::QueryFailed` - If devices cannot be enumerated
    /// * `CameraError::DeviceNotFound` - If the device index doesn't exist
    pub fn open(constraints: CaptureConstraints) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == constraints.device_index) {
            return Err(CameraError::DeviceNotFound(constraints.device_index));
        }

        Ok(Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            capture_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            constraints,
        })
    }

    /// Spawn the capture thread and block until the device reports back.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If capture is already running
    /// * `CameraError::PermissionDenied` - If access to the device is refused
    /// * `CameraError::OpenFailed` / `StreamFailed` - For other device failures
    pub fn start(&mut self) -> Result<Resolution, CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let constraints = self.constraints.clone();
        let (info_tx, info_rx) = mpsc::channel();

        self.capture_thread = Some(std::thread::spawn(move || {
            run_capture_loop(constraints, buffer, stop, info_tx);
        }));

        match info_rx.recv() {
            Ok(Ok(resolution)) => Ok(resolution),
            Ok(Err(e)) => {
                self.stop();
                Err(e)
            }
            Err(_) => {
                self.stop();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Signal the capture thread to stop and wait for it.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
        if let Ok(mut slot) = self.frame_buffer.lock() {
            *slot = None;
        }
    }

    /// Clone of the most recent decoded frame, if any.
    pub fn latest_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Whether at least one frame has been decoded since `start`.
    pub fn has_frame(&self) -> bool {
        self.frame_buffer
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
