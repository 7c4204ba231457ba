//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Capture resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Square 200x200 capture, matching the classifier input.
    pub const SQUARE: Resolution = Resolution {
        width: 200,
        height: 200,
    };

    /// VGA 640x480, the largest frame the classifier accepts natively.
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded camera frame in packed RGB.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When the capture thread produced this frame
    pub timestamp: Instant,
}

impl Frame {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_complete(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.width as usize * self.height as usize * Self::BYTES_PER_PIXEL
    }
}

/// Acquisition hints for the capture device.
///
/// The resolution and frame rate are "ideal" values: the device may deliver
/// something else and downstream code has to cope with it.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Camera device index
    pub device_index: u32,
    /// Preferred capture resolution
    pub ideal_resolution: Resolution,
    /// Preferred frame rate
    pub fps: u32,
    /// Mirror horizontally (selfie view)
    pub mirror: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            device_index: 0,
            ideal_resolution: Resolution::default(),
            fps: 30,
            mirror: false,
        }
    }
}

/// Readiness of the capture session as seen by the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraStatus {
    /// Acquisition in progress, or stream open but no frame decoded yet
    Requesting,
    /// Frames are available
    Ready,
    /// The user or OS refused camera access
    Denied(String),
    /// The device is missing or failed to open
    Unavailable(String),
}

impl CameraStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CameraStatus::Ready)
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// Failed to query camera devices
    QueryFailed(String),
    /// Failed to open camera
    OpenFailed(String),
    /// Camera permission denied
    PermissionDenied(String),
    /// Camera device not found at specified index
    DeviceNotFound(u32),
    /// Failed to start video stream
    StreamFailed(String),
    /// Capture thread is already running
    AlreadyRunning,
}

impl CameraError {
    /// The session status this error leaves the camera in.
    pub fn to_status(&self) -> CameraStatus {
        match self {
            CameraError::PermissionDenied(reason) => CameraStatus::Denied(reason.clone()),
            other => CameraStatus::Unavailable(other.to_string()),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::PermissionDenied(msg) => {
                write!(f, "Camera permission denied: {}", msg)
            }
            CameraError::DeviceNotFound(index) => {
                write!(
                    f,
                    "Camera device {} not found. Run 'list-cameras' to see available devices",
                    index
                )
            }
            CameraError::StreamFailed(msg) => write!(f, "Failed to start camera stream: {}", msg),
            CameraError::AlreadyRunning => write!(f, "Capture thread is already running"),
        }
    }
}

impl std::error::Error for CameraError {}
