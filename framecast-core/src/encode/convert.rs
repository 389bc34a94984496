//! Pixel format conversion
//!
//! Snapshots arrive as 32-bit RGBA or BGRA. JPEG wants packed RGB8 and the
//! raw sink wants RGB565.

use crate::error::{FramecastError, Result};
use crate::types::RawImage;

fn check_len(img: &RawImage) -> Result<()> {
    let expected = img.expected_len();
    if img.data.len() < expected {
        return Err(FramecastError::encoder(format!(
            "Buffer too small for {}: expected {} bytes, got {}",
            img.dimensions,
            expected,
            img.data.len()
        )));
    }
    Ok(())
}

/// Pack to 24-bit RGB, dropping alpha
pub fn to_rgb8(img: &RawImage) -> Result<Vec<u8>> {
    check_len(img)?;

    let mut rgb = Vec::with_capacity(img.dimensions.pixel_count() * 3);
    for px in img.data[..img.expected_len()].chunks_exact(4) {
        let (r, g, b) = img.layout.rgb(px);
        rgb.extend_from_slice(&[r, g, b]);
    }
    Ok(rgb)
}

/// Pack one pixel to RGB565
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

/// Pack to 16-bit RGB565 in native byte order (GStreamer `RGB16`)
pub fn to_rgb16(img: &RawImage) -> Result<Vec<u8>> {
    check_len(img)?;

    let pixels: Vec<u16> = img.data[..img.expected_len()]
        .chunks_exact(4)
        .map(|px| {
            let (r, g, b) = img.layout.rgb(px);
            rgb565(r, g, b)
        })
        .collect();
    Ok(bytemuck::cast_slice(&pixels).to_vec())
}

/// Pack already-decoded RGB8 to RGB565
pub fn rgb8_to_rgb16(rgb: &[u8]) -> Vec<u8> {
    let pixels: Vec<u16> = rgb
        .chunks_exact(3)
        .map(|px| rgb565(px[0], px[1], px[2]))
        .collect();
    bytemuck::cast_slice(&pixels).to_vec()
}
