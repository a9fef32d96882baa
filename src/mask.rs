//! Background-removal mask pipeline.
//!
//! Turns an opaque photo of a signature or stamp into an RGBA image whose
//! background is transparent. Two classification modes exist:
//!
//! - **standard**: a pixel is background when all channels are at least
//!   `threshold` (white paper), or, with shadow removal, when it is a
//!   near-gray pixel brighter than `shadow_threshold` (scanner shadow).
//! - **line only**: a pixel is ink when its luminance is well below the mean
//!   of its neighbourhood and not brighter than `shadow_threshold`. The
//!   resulting mask is cleaned with a [`NoiseReducer`].
//!
//! Either way the alpha channel is then blurred and smoothed.

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use log::debug;

use crate::adjust::{self, luminance_map};
use crate::alpha;
use crate::noise::{NoiseReducer, NoiseReduction, SET};

/// Maximum pairwise channel difference for a pixel to count as gray.
const GRAY_TOLERANCE: i16 = 30;

/// Constants of the adaptive ink classifier.
///
/// The defaults were tuned by hand on scanned signatures and are exposed so
/// callers can retune them for other material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineExtraction {
    /// Side of the square window used for the local mean, in pixels.
    pub window: u32,
    /// How far below the local mean a pixel must be to count as ink.
    pub offset: f32,
}

impl Default for LineExtraction {
    fn default() -> Self {
        Self {
            window: 20,
            offset: 30.0,
        }
    }
}

/// Parameters for [`remove_background`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalParams {
    /// A pixel with every channel at or above this value is white background.
    pub threshold: u8,
    /// Contrast factor applied before masking (`>= 1.0` sharpens).
    pub contrast: f32,
    /// Brightness factor applied before contrast.
    pub brightness: f32,
    /// Also remove bright near-gray pixels (standard mode only).
    pub shadow_removal: bool,
    /// Brightness above which gray pixels count as shadow, and above which
    /// pixels are never ink in line-only mode.
    pub shadow_threshold: u8,
    /// Keep only dark ink pixels instead of removing white.
    pub line_only: bool,
    /// Gaussian blur radius for the alpha channel (0 disables).
    pub blur_radius: u32,
    /// Number of 3x3 smoothing passes over the alpha channel.
    pub edge_smooth_passes: u32,
    /// Adaptive classifier constants for line-only mode.
    pub line: LineExtraction,
    /// Speckle cleanup used in line-only mode.
    pub noise: NoiseReduction,
}

impl Default for RemovalParams {
    fn default() -> Self {
        Self {
            threshold: 200,
            contrast: 1.5,
            brightness: 1.0,
            shadow_removal: true,
            shadow_threshold: 150,
            line_only: true,
            blur_radius: 1,
            edge_smooth_passes: 2,
            line: LineExtraction::default(),
            noise: NoiseReduction::default(),
        }
    }
}

impl RemovalParams {
    /// Clamp blur and smoothing into their supported `0..=5` range.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            blur_radius: self.blur_radius.min(5),
            edge_smooth_passes: self.edge_smooth_passes.min(5),
            contrast: self.contrast.max(0.0),
            brightness: self.brightness.max(0.0),
            line: LineExtraction {
                window: self.line.window.max(1),
                offset: self.line.offset,
            },
            ..self.clone()
        }
    }
}

/// Remove the background of `source`.
///
/// Returns a new image of the same size. RGB carries the contrast/brightness
/// adjusted source; alpha is 0 for background and 255 for foreground before
/// blurring and smoothing.
#[must_use]
pub fn remove_background(source: &RgbImage, params: &RemovalParams) -> RgbaImage {
    let params = params.sanitized();
    let adjusted = adjust::adjust(source, params.brightness, params.contrast);

    let background = if params.line_only {
        debug!(
            "line-only extraction: window={}, offset={}, shadow_threshold={}, noise={:?}",
            params.line.window, params.line.offset, params.shadow_threshold, params.noise
        );
        let ink = ink_mask(&adjusted, params.shadow_threshold, params.line, &params.noise);
        invert(&ink)
    } else {
        debug!(
            "standard removal: threshold={}, shadow_removal={}, shadow_threshold={}",
            params.threshold, params.shadow_removal, params.shadow_threshold
        );
        let mut white = white_mask(&adjusted, params.threshold);
        if params.shadow_removal {
            let shadow = shadow_mask(&adjusted, params.shadow_threshold);
            union_into(&mut white, &shadow);
        }
        white
    };

    let mut out = apply_background_mask(&adjusted, &background);
    alpha::soften(&mut out, params.blur_radius, params.edge_smooth_passes);
    out
}

/// Pixels whose channels are all at least `threshold`.
#[must_use]
pub fn white_mask(img: &RgbImage, threshold: u8) -> GrayImage {
    classify(img, |px| px.0.iter().all(|&c| c >= threshold))
}

/// Near-gray pixels whose channels all exceed `shadow_threshold`.
#[must_use]
pub fn shadow_mask(img: &RgbImage, shadow_threshold: u8) -> GrayImage {
    classify(img, |px| is_near_gray(*px) && px.0.iter().all(|&c| c > shadow_threshold))
}

/// Dark ink pixels, classified against the local mean luminance.
///
/// A pixel is ink when its luminance is more than `line.offset` below the
/// mean of the `line.window` square around it and at most
/// `shadow_threshold`. The window is clipped at the image border. The raw
/// classification is cleaned with `reducer`.
#[must_use]
pub fn ink_mask(
    img: &RgbImage,
    shadow_threshold: u8,
    line: LineExtraction,
    reducer: &dyn NoiseReducer,
) -> GrayImage {
    let (w, h) = img.dimensions();
    let lum = luminance_map(img);
    let means = local_means(&lum, w as usize, h as usize, line.window.max(1) as usize);
    let ceiling = f32::from(shadow_threshold);

    let mut raw = GrayImage::new(w, h);
    for ((px, &l), &mean) in raw.pixels_mut().zip(&lum).zip(&means) {
        if l < mean - line.offset && l <= ceiling {
            *px = Luma([SET]);
        }
    }
    reducer.reduce(&raw)
}

/// Largest absolute difference between any two channels is below 30.
fn is_near_gray(px: Rgb<u8>) -> bool {
    let [r, g, b] = px.0.map(i16::from);
    (r - g).abs().max((g - b).abs()).max((r - b).abs()) < GRAY_TOLERANCE
}

fn classify(img: &RgbImage, predicate: impl Fn(&Rgb<u8>) -> bool) -> GrayImage {
    let mut mask = GrayImage::new(img.width(), img.height());
    for (src, dst) in img.pixels().zip(mask.pixels_mut()) {
        if predicate(src) {
            *dst = Luma([SET]);
        }
    }
    mask
}

fn union_into(acc: &mut GrayImage, other: &GrayImage) {
    for (a, b) in acc.pixels_mut().zip(other.pixels()) {
        a[0] = a[0].max(b[0]);
    }
}

fn invert(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for px in out.pixels_mut() {
        px[0] = if px[0] > 0 { 0 } else { SET };
    }
    out
}

/// Attach alpha to `img`: 0 where `background` is set, 255 elsewhere.
fn apply_background_mask(img: &RgbImage, background: &GrayImage) -> RgbaImage {
    let mut out = RgbaImage::new(img.width(), img.height());
    for ((dst, src), bg) in out.pixels_mut().zip(img.pixels()).zip(background.pixels()) {
        let [r, g, b] = src.0;
        let a = if bg[0] > 0 { 0 } else { u8::MAX };
        *dst = Rgba([r, g, b, a]);
    }
    out
}

/// Mean of each pixel's `window`-sized square neighbourhood.
///
/// The window spans offsets `-window/2 ..= window - 1 - window/2` on each
/// axis and is clipped to the image, averaging only in-bounds samples.
/// Uses a summed-area table so the cost is independent of the window size.
fn local_means(values: &[f32], width: usize, height: usize, window: usize) -> Vec<f32> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let stride = width + 1;
    let mut integral = vec![0.0_f64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0.0_f64;
        for x in 0..width {
            row_sum += f64::from(values[y * width + x]);
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let before = window / 2;
    let after = window - 1 - before;
    let mut means = Vec::with_capacity(width * height);
    for y in 0..height {
        let y0 = y.saturating_sub(before);
        let y1 = (y + after + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(before);
            let x1 = (x + after + 1).min(width);
            let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                - integral[y1 * stride + x0]
                + integral[y0 * stride + x0];
            #[allow(clippy::cast_precision_loss)]
            let count = ((x1 - x0) * (y1 - y0)) as f64;
            #[allow(clippy::cast_possible_truncation)]
            means.push((sum / count) as f32);
        }
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(threshold: u8) -> RemovalParams {
        RemovalParams {
            threshold,
            contrast: 1.0,
            brightness: 1.0,
            shadow_removal: false,
            line_only: false,
            blur_radius: 0,
            edge_smooth_passes: 0,
            ..RemovalParams::default()
        }
    }

    #[test]
    fn white_at_or_above_threshold_becomes_transparent() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([200, 200, 200]));
        img.put_pixel(1, 0, Rgb([200, 199, 255]));
        img.put_pixel(2, 0, Rgb([0, 0, 0]));
        let out = remove_background(&img, &standard(200));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], 255);
        assert_eq!(out.get_pixel(2, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn shadow_removal_catches_bright_gray() {
        let img = RgbImage::from_pixel(2, 2, Rgb([170, 175, 180]));
        let without = remove_background(&img, &standard(200));
        assert!(without.pixels().all(|px| px[3] == 255));

        let params = RemovalParams {
            shadow_removal: true,
            shadow_threshold: 150,
            ..standard(200)
        };
        let with = remove_background(&img, &params);
        assert!(with.pixels().all(|px| px[3] == 0));
    }

    #[test]
    fn colourful_pixels_are_not_shadow() {
        let img = RgbImage::from_pixel(1, 1, Rgb([250, 160, 160]));
        assert_eq!(shadow_mask(&img, 150).get_pixel(0, 0)[0], 0);
        assert!(!is_near_gray(Rgb([100, 100, 130])));
        assert!(is_near_gray(Rgb([100, 110, 129])));
    }

    #[test]
    fn ink_mask_finds_dark_stroke_on_paper() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([235, 235, 235]));
        for y in 10..30 {
            for x in 18..22 {
                img.put_pixel(x, y, Rgb([20, 20, 40]));
            }
        }
        let mask = ink_mask(&img, 150, LineExtraction::default(), &NoiseReduction::Morphology);
        assert_eq!(mask.get_pixel(20, 20)[0], SET);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(30, 20)[0], 0);
    }

    #[test]
    fn ink_must_not_exceed_shadow_threshold() {
        let mut img = RgbImage::from_pixel(30, 30, Rgb([250, 250, 250]));
        for y in 10..20 {
            for x in 10..20 {
                img.put_pixel(x, y, Rgb([200, 200, 200]));
            }
        }
        // 200 is far enough below the local mean but brighter than 150.
        let mask = ink_mask(&img, 150, LineExtraction::default(), &NoiseReduction::Off);
        assert!(mask.pixels().all(|px| px[0] == 0));
    }

    #[test]
    fn line_only_keeps_ink_rgb_and_clears_paper() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([240, 240, 240]));
        for y in 15..25 {
            for x in 5..35 {
                img.put_pixel(x, y, Rgb([10, 10, 90]));
            }
        }
        let params = RemovalParams {
            line_only: true,
            contrast: 1.0,
            brightness: 1.0,
            blur_radius: 0,
            edge_smooth_passes: 0,
            ..RemovalParams::default()
        };
        let out = remove_background(&img, &params);
        assert_eq!(out.get_pixel(20, 20), &Rgba([10, 10, 90, 255]));
        assert_eq!(out.get_pixel(20, 2)[3], 0);
    }

    #[test]
    fn uniform_image_in_line_mode_has_no_ink() {
        let img = RgbImage::from_pixel(12, 12, Rgb([30, 30, 30]));
        let params = RemovalParams {
            blur_radius: 0,
            edge_smooth_passes: 0,
            ..RemovalParams::default()
        };
        let out = remove_background(&img, &params);
        assert!(out.pixels().all(|px| px[3] == 0));
    }

    #[test]
    fn degenerate_image_does_not_panic() {
        let img = RgbImage::new(0, 0);
        let out = remove_background(&img, &RemovalParams::default());
        assert_eq!(out.dimensions(), (0, 0));
        let out = remove_background(&img, &standard(200));
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn local_means_clip_the_window() {
        let values = vec![
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
        ];
        let means = local_means(&values, 3, 2, 3);
        // Top-left sees (0..2, 0..2): 1, 2, 4, 5.
        assert!((means[0] - 3.0).abs() < 1e-6);
        // Centre of the bottom row sees everything.
        assert!((means[4] - 3.5).abs() < 1e-6);
    }

    #[test]
    fn sanitized_caps_filter_ranges() {
        let params = RemovalParams {
            blur_radius: 9,
            edge_smooth_passes: 12,
            ..RemovalParams::default()
        }
        .sanitized();
        assert_eq!(params.blur_radius, 5);
        assert_eq!(params.edge_smooth_passes, 5);
    }
}
