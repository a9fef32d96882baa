//! Tone adjustments applied to a source photo before masking.

use image::{Rgb, RgbImage};

/// Channel value around which contrast is stretched.
const CONTRAST_PIVOT: f32 = 128.0;

/// Luminance of an RGB pixel: `0.2989*R + 0.5870*G + 0.1140*B`.
#[must_use]
pub fn luminance(px: Rgb<u8>) -> f32 {
    0.2989 * f32::from(px[0]) + 0.5870 * f32::from(px[1]) + 0.1140 * f32::from(px[2])
}

/// Per-pixel luminance as a flat row-major buffer.
#[must_use]
pub fn luminance_map(img: &RgbImage) -> Vec<f32> {
    img.pixels().map(|px| luminance(*px)).collect()
}

/// Apply brightness then contrast to a copy of `img`.
///
/// Brightness scales each channel (`v * brightness`); contrast stretches the
/// deviation from mid-gray (`128 + (v - 128) * contrast`). Both steps clamp to
/// `[0, 255]`, and `1.0` for either factor leaves the image untouched.
#[must_use]
pub fn adjust(img: &RgbImage, brightness: f32, contrast: f32) -> RgbImage {
    let mut out = img.clone();
    #[allow(clippy::float_cmp)]
    let identity = brightness == 1.0 && contrast == 1.0;
    if identity {
        return out;
    }

    for px in out.pixels_mut() {
        for ch in 0..3 {
            let bright = clamp_channel(f32::from(px[ch]) * brightness);
            let stretched = CONTRAST_PIVOT + (f32::from(bright) - CONTRAST_PIVOT) * contrast;
            px[ch] = clamp_channel(stretched);
        }
    }
    out
}

/// Round and clamp a float channel value into `u8`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
