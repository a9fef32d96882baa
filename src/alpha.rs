//! Alpha-channel post-processing: Gaussian blur and 3x3 edge smoothing.
//!
//! Hard 0/255 masks leave jagged stair-steps around ink. Both filters here
//! operate on the alpha channel only and leave RGB untouched. Out-of-image
//! samples replicate the nearest edge pixel, so a uniform alpha plane is a
//! fixed point of both filters.

use image::RgbaImage;

use crate::adjust::clamp_channel;

/// Weights of the 3x3 smoothing kernel, row-major.
const SMOOTH_KERNEL: [u32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
/// Sum of [`SMOOTH_KERNEL`].
const SMOOTH_DIVISOR: u32 = 13;

/// Blur then smooth the alpha channel of `img` in place.
///
/// `blur_radius` is the Gaussian sigma in pixels (0 skips the blur);
/// `smooth_passes` is how many times the 3x3 smoothing kernel is applied.
pub fn soften(img: &mut RgbaImage, blur_radius: u32, smooth_passes: u32) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    if blur_radius == 0 && smooth_passes == 0 {
        return;
    }

    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut alpha: Vec<u8> = img.pixels().map(|px| px[3]).collect();

    if blur_radius > 0 {
        #[allow(clippy::cast_precision_loss)]
        let sigma = blur_radius as f32;
        alpha = gaussian_blur(&alpha, w, h, sigma);
    }
    for _ in 0..smooth_passes {
        alpha = smooth(&alpha, w, h);
    }

    for (px, a) in img.pixels_mut().zip(alpha) {
        px[3] = a;
    }
}

/// Normalised 1-D Gaussian kernel covering three standard deviations.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let radius = (sigma * 3.0).ceil() as usize;
    let denom = 2.0 * sigma * sigma;
    #[allow(clippy::cast_precision_loss)]
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-(d * d) / denom).exp()
        })
        .collect();
    let total: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }
    kernel
}

/// Separable Gaussian blur over a single-channel plane.
fn gaussian_blur(plane: &[u8], width: usize, height: usize, sigma: f32) -> Vec<u8> {
    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    let mut horizontal = vec![0.0_f32; width * height];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sx = (x + i).saturating_sub(radius).min(width - 1);
                acc += k * f32::from(row[sx]);
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0_u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sy = (y + i).saturating_sub(radius).min(height - 1);
                acc += k * horizontal[sy * width + x];
            }
            out[y * width + x] = clamp_channel(acc);
        }
    }
    out
}

/// One pass of the 3x3 smoothing kernel with rounded integer division.
fn smooth(plane: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0_u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0_u32;
            for (k, weight) in SMOOTH_KERNEL.iter().enumerate() {
                let sx = (x + k % 3).saturating_sub(1).min(width - 1);
                let sy = (y + k / 3).saturating_sub(1).min(height - 1);
                acc += weight * u32::from(plane[sy * width + sx]);
            }
            let value = (acc + SMOOTH_DIVISOR / 2) / SMOOTH_DIVISOR;
            out[y * width + x] = u8::try_from(value).unwrap_or(u8::MAX);
        }
    }
    out
}
