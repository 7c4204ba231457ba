//! Camera source: device enumeration, capture thread and session readiness.
//!
//! - Device enumeration via [`list_devices`]
//! - Raw capture via [`CameraCapture`]
//! - The session the polling loop reads from via [`CameraSource`] and the
//!   [`FrameSource`] trait

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod source;
mod types;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use source::{CameraSource, FrameSource};
pub use types::{
    CameraError, CameraInfo, CameraStatus, CaptureConstraints, Frame, Resolution,
};
