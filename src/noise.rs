//! Speckle removal for binary ink masks.
//!
//! Two interchangeable strategies clean up a 0/255 mask after ink
//! classification:
//!
//! - [`Morphology`]: binary opening with a 2x2 element followed by closing
//!   with a 3x3 element. Opening drops isolated specks, closing bridges
//!   one-pixel gaps inside strokes.
//! - [`MajorityVote`]: a pixel survives when at least five of the nine pixels
//!   in its 3x3 neighbourhood are set. Cheaper, and slightly thins strokes.
//!
//! [`NoiseReduction`] selects between them at runtime.

use image::GrayImage;

/// Mask value for a set pixel.
pub const SET: u8 = 255;

/// Minimum number of set pixels in a 3x3 window for [`MajorityVote`].
const MAJORITY: usize = 5;

/// A strategy that removes noise from a binary mask.
pub trait NoiseReducer {
    /// Return a cleaned copy of `mask`. Non-zero pixels are treated as set.
    fn reduce(&self, mask: &GrayImage) -> GrayImage;
}

/// Selects which [`NoiseReducer`] the ink extractor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseReduction {
    /// Opening (2x2) then closing (3x3).
    #[default]
    Morphology,
    /// 3x3 majority vote.
    MajorityVote,
    /// Leave the mask as classified.
    Off,
}

impl NoiseReducer for NoiseReduction {
    fn reduce(&self, mask: &GrayImage) -> GrayImage {
        match *self {
            Self::Morphology => Morphology.reduce(mask),
            Self::MajorityVote => MajorityVote.reduce(mask),
            Self::Off => mask.clone(),
        }
    }
}

/// Opening with a 2x2 element followed by closing with a 3x3 element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Morphology;

impl NoiseReducer for Morphology {
    fn reduce(&self, mask: &GrayImage) -> GrayImage {
        let opened = dilate(&erode(mask, 2), 2);
        erode(&dilate(&opened, 3), 3)
    }
}

/// Keeps interior pixels with at least five set neighbours (self included).
///
/// The one-pixel frame around the image is always cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityVote;

impl NoiseReducer for MajorityVote {
    fn reduce(&self, mask: &GrayImage) -> GrayImage {
        let (w, h) = mask.dimensions();
        let mut out = GrayImage::new(w, h);
        if w < 3 || h < 3 {
            return out;
        }

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let count = (y - 1..=y + 1)
                    .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                    .filter(|&(nx, ny)| mask.get_pixel(nx, ny)[0] > 0)
                    .count();
                if count >= MAJORITY {
                    out.get_pixel_mut(x, y)[0] = SET;
                }
            }
        }
        out
    }
}

/// Offsets covered by a square structuring element of side `size`.
///
/// The element's origin sits at index `size / 2`, so a 2x2 element covers
/// offsets `-1..=0` and a 3x3 element `-1..=1`.
#[allow(clippy::cast_possible_wrap)]
fn element_offsets(size: u32) -> std::ops::RangeInclusive<i64> {
    let centre = i64::from(size / 2);
    -centre..=i64::from(size) - 1 - centre
}

fn is_set(mask: &GrayImage, x: i64, y: i64) -> bool {
    let (w, h) = mask.dimensions();
    if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
        return false;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = mask.get_pixel(x as u32, y as u32)[0];
    value > 0
}

/// Binary erosion with a `size`x`size` element. Pixels outside the image
/// count as unset, so set regions touching the border shrink.
#[must_use]
pub fn erode(mask: &GrayImage, size: u32) -> GrayImage {
    let offsets = element_offsets(size);
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, px) in out.enumerate_pixels_mut() {
        let (cx, cy) = (i64::from(x), i64::from(y));
        let keep = offsets
            .clone()
            .all(|dy| offsets.clone().all(|dx| is_set(mask, cx + dx, cy + dy)));
        if keep {
            px[0] = SET;
        }
    }
    out
}

/// Binary dilation with a `size`x`size` element (reflected about its origin).
#[must_use]
pub fn dilate(mask: &GrayImage, size: u32) -> GrayImage {
    let offsets = element_offsets(size);
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, px) in out.enumerate_pixels_mut() {
        let (cx, cy) = (i64::from(x), i64::from(y));
        let hit = offsets
            .clone()
            .any(|dy| offsets.clone().any(|dx| is_set(mask, cx - dx, cy - dy)));
        if hit {
            px[0] = SET;
        }
    }
    out
}
