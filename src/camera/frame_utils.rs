//! Conversions from nokhwa buffers into [`Frame`]s.

use nokhwa::pixel_format::RgbFormat;
use std::time::Instant;

use super::types::Frame;

/// Decode a nokhwa buffer (MJPEG, YUYV, NV12, ...) into an RGB frame.
///
/// Returns `None` for buffers that cannot be decoded yet; the first few
/// buffers after opening a stream are often incomplete.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let (width, height) = decoded.dimensions();

    let frame = Frame {
        data: decoded.into_raw(),
        width,
        height,
        timestamp: Instant::now(),
    };
    frame.is_complete().then_some(frame)
}

/// Flip a frame left-right in place.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let bpp = Frame::BYTES_PER_PIXEL;
    let stride = width * bpp;

    for row in frame.data.chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
