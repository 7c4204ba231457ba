//! The capture session seen by the rest of the client.

use std::sync::{Mutex, MutexGuard};

use super::capture::CameraCapture;
use super::types::{CameraError, CameraStatus, CaptureConstraints, Frame, Resolution};

/// Anything that can hand the polling loop a current video frame.
///
/// `status()` is the sole authority on readiness: callers must not ask for
/// frames while it reports anything other than [`CameraStatus::Ready`].
pub trait FrameSource: Send + Sync {
    fn status(&self) -> CameraStatus;

    /// The current frame, or `None` if none has been decoded yet.
    fn latest_frame(&self) -> Option<Frame>;
}

/// Capture session backed by a local camera.
///
/// Created in the `Requesting` state; [`CameraSource::acquire`] opens the
/// device (blocking) and either hands the stream to the session or records
/// why it could not. Failed acquisitions are not retried.
#[derive(Debug)]
pub struct CameraSource {
    capture: Mutex<Option<CameraCapture>>,
    status: Mutex<CameraStatus>,
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSource {
    pub fn new() -> Self {
        Self {
            capture: Mutex::new(None),
            status: Mutex::new(CameraStatus::Requesting),
        }
    }

    /// Open the device described by `constraints` and start streaming.
    ///
    /// Returns the resolution the device actually delivers, which may differ
    /// from the ideal one requested.
    pub fn acquire(&self, constraints: CaptureConstraints) -> Result<Resolution, CameraError> {
        self.release();
        *lock(&self.status) = CameraStatus::Requesting;

        let ideal = constraints.ideal_resolution;
        let opened = CameraCapture::open(constraints).and_then(|mut capture| {
            let resolution = capture.start()?;
            Ok((capture, resolution))
        });

        match opened {
            Ok((capture, resolution)) => {
                if resolution != ideal {
                    log::info!(
                        "Camera delivers {} instead of requested {}",
                        resolution,
                        ideal
                    );
                } else {
                    log::info!("Camera streaming at {}", resolution);
                }
                *lock(&self.capture) = Some(capture);
                Ok(resolution)
            }
            Err(e) => {
                log::error!("Camera acquisition failed: {}", e);
                *lock(&self.status) = e.to_status();
                Err(e)
            }
        }
    }

    /// Stop the stream and release the device.
    pub fn release(&self) {
        if let Some(mut capture) = lock(&self.capture).take() {
            capture.stop();
        }
    }
}

impl FrameSource for CameraSource {
    fn status(&self) -> CameraStatus {
        let stored = lock(&self.status).clone();
        if !matches!(stored, CameraStatus::Requesting) {
            return stored;
        }

        let capture = lock(&self.capture);
        match capture.as_ref() {
            None => CameraStatus::Requesting,
            Some(c) if !c.is_running() => {
                CameraStatus::Unavailable("capture stream stopped".to_string())
            }
            Some(c) if c.has_frame() => CameraStatus::Ready,
            Some(_) => CameraStatus::Requesting,
        }
    }

    fn latest_frame(&self) -> Option<Frame> {
        lock(&self.capture).as_ref()?.latest_frame()
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
