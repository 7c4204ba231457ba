//! Background capture thread.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CaptureConstraints, Frame, Resolution};

/// Substrings in backend error messages that indicate an access refusal.
const PERMISSION_MARKERS: &[&str] = &["permission", "denied", "authorization", "not authorized"];

/// Open the device and keep the latest decoded frame in `buffer` until `stop`
/// is raised.
///
/// The negotiated resolution (or the open error) is reported once on
/// `info_tx` before any frame is captured.
pub fn run_capture_loop(
    constraints: CaptureConstraints,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    info_tx: Sender<Result<Resolution, CameraError>>,
) {
    let index = CameraIndex::Index(constraints.device_index);

    let mut camera = match open_camera_with_fallback(&index, &constraints) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(classify_open_error(
            &e.to_string(),
            CameraError::StreamFailed,
        )));
        return;
    }

    let res = camera.resolution();
    let _ = info_tx.send(Ok(Resolution {
        width: res.width(),
        height: res.height(),
    }));

    while !stop.load(Ordering::Relaxed) {
        if let Ok(raw_frame) = camera.frame() {
            if let Some(mut frame) = convert_to_rgb(&raw_frame) {
                if constraints.mirror {
                    mirror_horizontal(&mut frame);
                }
                if let Ok(mut slot) = buffer.lock() {
                    *slot = Some(frame);
                }
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
}

/// Try the ideal format first, then progressively looser requests.
fn open_camera_with_fallback(
    index: &CameraIndex,
    constraints: &CaptureConstraints,
) -> Result<Camera, CameraError> {
    let ideal = nokhwa::utils::Resolution::new(
        constraints.ideal_resolution.width,
        constraints.ideal_resolution.height,
    );
    let attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            ideal,
            NokhwaFrameFormat::NV12,
            constraints.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            ideal,
            NokhwaFrameFormat::MJPEG,
            constraints.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no capture format accepted");
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("Camera format request rejected: {}", e);
                last_error = e.to_string();
            }
        }
    }

    Err(classify_open_error(&last_error, CameraError::OpenFailed))
}

/// Map a backend error message onto `PermissionDenied` or the given fallback.
fn classify_open_error(message: &str, fallback: impl FnOnce(String) -> CameraError) -> CameraError {
    let lower = message.to_lowercase();
    if PERMISSION_MARKERS.iter().any(|m| lower.contains(m)) {
        CameraError::PermissionDenied(message.to_string())
    } else {
        fallback(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_message() {
        let err = classify_open_error("Access denied by user", CameraError::OpenFailed);
        assert!(matches!(err, CameraError::PermissionDenied(_)));
    }

    #[test]
    fn test_classify_other_message_uses_fallback() {
        let err = classify_open_error("device busy", CameraError::StreamFailed);
        match err {
            CameraError::StreamFailed(msg) => assert_eq!(msg, "device busy"),
            other => panic!("Expected StreamFailed, got {:?}", other),
        }
    }
}
