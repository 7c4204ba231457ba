//! Frame encoder: rasterize the current camera frame into the classifier's
//! input geometry and serialize it as JPEG.
//!
//! Frames are never stretched. In [`OutputGeometry::Fixed`] mode the frame is
//! scaled to fit and centered on a black canvas (letterbox/pillarbox); in
//! [`OutputGeometry::Native`] mode the native aspect is kept and the frame is
//! only downscaled when it exceeds the bound.

use std::ops::RangeInclusive;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::camera::{Frame, FrameSource, Resolution};

/// MIME type of every encoded frame.
pub const JPEG_MIME: &str = "image/jpeg";

/// Default JPEG quality factor.
pub const DEFAULT_QUALITY: u8 = 92;

/// Accepted JPEG quality factors.
pub const QUALITY_RANGE: RangeInclusive<u8> = 80..=95;

/// Fill color for letterbox bars.
const LETTERBOX_FILL: Rgb<u8> = Rgb([0, 0, 0]);

/// Errors produced while encoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JPEG quality {0} outside accepted range 80..=95")]
    InvalidQuality(u8),

    #[error("output geometry must be non-zero, got {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("frame buffer of {len} bytes does not match {width}x{height} RGB")]
    InvalidFrame { width: u32, height: u32, len: usize },

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Target raster for encoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputGeometry {
    /// Always produce exactly `width`x`height`, letterboxing as needed.
    Fixed { width: u32, height: u32 },
    /// Keep the capture size, downscaling to fit within the bound.
    Native { max_width: u32, max_height: u32 },
}

impl Default for OutputGeometry {
    fn default() -> Self {
        OutputGeometry::Fixed {
            width: Resolution::SQUARE.width,
            height: Resolution::SQUARE.height,
        }
    }
}

/// Where a source image lands on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub canvas: (u32, u32),
    pub scaled: (u32, u32),
    pub offset: (u32, u32),
}

impl OutputGeometry {
    fn validate(&self) -> Result<(), EncodeError> {
        let (width, height) = match *self {
            OutputGeometry::Fixed { width, height } => (width, height),
            OutputGeometry::Native {
                max_width,
                max_height,
            } => (max_width, max_height),
        };
        if width == 0 || height == 0 {
            return Err(EncodeError::InvalidGeometry { width, height });
        }
        Ok(())
    }

    /// Compute the canvas and the aspect-preserving placement of a
    /// `src_width`x`src_height` image on it.
    pub fn place(&self, src_width: u32, src_height: u32) -> Placement {
        match *self {
            OutputGeometry::Fixed { width, height } => {
                let scaled = fit_within(src_width, src_height, width, height);
                Placement {
                    canvas: (width, height),
                    scaled,
                    offset: ((width - scaled.0) / 2, (height - scaled.1) / 2),
                }
            }
            OutputGeometry::Native {
                max_width,
                max_height,
            } => {
                let scaled = if src_width <= max_width && src_height <= max_height {
                    (src_width, src_height)
                } else {
                    fit_within(src_width, src_height, max_width, max_height)
                };
                Placement {
                    canvas: scaled,
                    scaled,
                    offset: (0, 0),
                }
            }
        }
    }
}

/// Largest size with the source aspect ratio that fits in the bound.
fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = f64::min(
        max_width as f64 / src_width as f64,
        max_height as f64 / src_height as f64,
    );
    let width = ((src_width as f64 * scale).round() as u32).clamp(1, max_width);
    let height = ((src_height as f64 * scale).round() as u32).clamp(1, max_height);
    (width, height)
}

/// One JPEG-encoded frame, valid for exactly one submission.
///
/// Deliberately not `Clone`: a fresh frame is encoded on every tick.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    bytes: Vec<u8>,
    mime: &'static str,
    width: u32,
    height: u32,
}

impl EncodedFrame {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `data:image/jpeg;base64,...`, the form the endpoint expects.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Turns camera frames into [`EncodedFrame`]s with a fixed geometry and
/// quality for the lifetime of the encoder.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    geometry: OutputGeometry,
    quality: u8,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self {
            geometry: OutputGeometry::default(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl FrameEncoder {
    /// # Errors
    /// * `EncodeError::InvalidQuality` - If `quality` is outside 80..=95
    /// * `EncodeError::InvalidGeometry` - If the geometry has a zero side
    pub fn new(geometry: OutputGeometry, quality: u8) -> Result<Self, EncodeError> {
        if !QUALITY_RANGE.contains(&quality) {
            return Err(EncodeError::InvalidQuality(quality));
        }
        geometry.validate()?;
        Ok(Self { geometry, quality })
    }

    pub fn geometry(&self) -> OutputGeometry {
        self.geometry
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode the source's current frame, if it has one.
    ///
    /// Returns `None` when the source is not ready or no frame has been
    /// decoded yet. That is the normal state during startup, not a failure.
    pub fn capture<S: FrameSource + ?Sized>(&self, source: &S) -> Option<EncodedFrame> {
        if !source.status().is_ready() {
            return None;
        }
        let frame = source.latest_frame()?;
        match self.encode(&frame) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                None
            }
        }
    }

    /// Encode a raw RGB camera frame.
    pub fn encode(&self, frame: &Frame) -> Result<EncodedFrame, EncodeError> {
        let invalid = || EncodeError::InvalidFrame {
            width: frame.width,
            height: frame.height,
            len: frame.data.len(),
        };
        if !frame.is_complete() {
            return Err(invalid());
        }
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(invalid)?;
        self.encode_image(&image)
    }

    /// Encode an already-decoded RGB image (used for still-image prediction).
    pub fn encode_image(&self, image: &RgbImage) -> Result<EncodedFrame, EncodeError> {
        let (src_width, src_height) = image.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(EncodeError::InvalidFrame {
                width: src_width,
                height: src_height,
                len: 0,
            });
        }

        let placement = self.geometry.place(src_width, src_height);
        let canvas = rasterize(image, placement);

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&canvas)?;

        Ok(EncodedFrame {
            bytes,
            mime: JPEG_MIME,
            width: placement.canvas.0,
            height: placement.canvas.1,
        })
    }
}

fn rasterize(image: &RgbImage, placement: Placement) -> RgbImage {
    let scaled = if image.dimensions() == placement.scaled {
        image.clone()
    } else {
        imageops::resize(image, placement.scaled.0, placement.scaled.1, FilterType::Triangle)
    };

    if placement.scaled == placement.canvas {
        return scaled;
    }

    let mut canvas = RgbImage::from_pixel(placement.canvas.0, placement.canvas.1, LETTERBOX_FILL);
    imageops::overlay(
        &mut canvas,
        &scaled,
        i64::from(placement.offset.0),
        i64::from(placement.offset.1),
    );
    canvas
}
