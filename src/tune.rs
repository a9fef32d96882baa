//! Automatic parameter selection from simple image statistics.
//!
//! Both heuristics are fixed lookup tables keyed on brightness and contrast
//! breakpoints; they never look at more than the global mean and standard
//! deviation of the source.

use image::RgbImage;
use log::debug;

use crate::adjust::luminance_map;
use crate::mask::RemovalParams;

/// Which auto-tune heuristic to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTune {
    /// Tune for standard white-background removal.
    General,
    /// Tune for line-only ink extraction.
    LineExtraction,
}

impl AutoTune {
    /// Derive parameters for `source`, starting from `base`.
    ///
    /// Only the fields the heuristic owns are overwritten; line-extraction
    /// constants and the noise strategy carry over from `base`.
    #[must_use]
    pub fn tune(self, source: &RgbImage, base: &RemovalParams) -> RemovalParams {
        match self {
            Self::General => general(source, base),
            Self::LineExtraction => line_extraction(source, base),
        }
    }
}

/// Tune for standard removal from the mean of all RGB samples.
#[must_use]
pub fn general(source: &RgbImage, base: &RemovalParams) -> RemovalParams {
    let mean = mean(source.as_raw().iter().map(|&v| f64::from(v)));
    debug!("auto-tune (general): mean sample value {mean:.1}");

    let (threshold, contrast, shadow_threshold) = if mean > 200.0 {
        (220, 2.0, 170)
    } else if mean > 150.0 {
        (200, 1.5, 150)
    } else {
        (180, 2.5, 130)
    };

    RemovalParams {
        threshold,
        contrast,
        brightness: 1.0,
        shadow_removal: true,
        shadow_threshold,
        line_only: false,
        blur_radius: 1,
        edge_smooth_passes: 2,
        ..base.clone()
    }
}

/// Tune for ink extraction from luminance mean and standard deviation.
#[must_use]
pub fn line_extraction(source: &RgbImage, base: &RemovalParams) -> RemovalParams {
    let lum = luminance_map(source);
    let avg = mean(lum.iter().map(|&v| f64::from(v)));
    let spread = stddev(&lum, avg);
    debug!("auto-tune (lines): luminance mean {avg:.1}, stddev {spread:.1}");

    let (contrast, brightness, shadow_threshold) = if spread < 30.0 {
        (3.0, 1.2, 180)
    } else if spread < 60.0 {
        (2.5, 1.1, 160)
    } else {
        (2.0, 1.0, 140)
    };

    let threshold = if avg > 200.0 {
        240
    } else if avg > 150.0 {
        220
    } else {
        200
    };

    RemovalParams {
        threshold,
        contrast,
        brightness,
        shadow_removal: true,
        shadow_threshold,
        line_only: true,
        blur_radius: 1,
        edge_smooth_passes: 1,
        ..base.clone()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_u64), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f64;
    sum / n
}

/// Population standard deviation.
fn stddev(values: &[f32], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let variance = values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}
