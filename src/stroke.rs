//! Recorded pen strokes and their rasterisation.
//!
//! A drawing surface reports pointer positions; [`StrokeRecorder`] turns each
//! move-while-pressed into an immutable [`StrokeSegment`] carrying the pen
//! settings in effect at that moment. [`draw_segment`] replays a segment onto
//! any `imageproc` canvas, so the same code paints colour images and the
//! single-channel masks used for intaglio stamps.

use image::{Rgb, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, Canvas};
use imageproc::point::Point;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::color::STAMP_RED;
use crate::error::{Error, Result};

/// Lower bound of the random width factor.
const JITTER_MIN: f32 = 0.7;
/// Upper bound of the random width factor.
const JITTER_MAX: f32 = 1.3;

/// How the ends of a segment are finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapStyle {
    /// A filled circle of radius `width / 2` at each endpoint.
    #[default]
    Round,
    /// No extra geometry; the segment stops square at its endpoints.
    Flat,
    /// A triangular spike extending `width / 3` past each endpoint.
    Pointed,
}

/// One recorded pointer-drag increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSegment {
    /// Where the pointer was.
    pub start: (f32, f32),
    /// Where the pointer moved to.
    pub end: (f32, f32),
    /// Line width in pixels, at least 1.
    pub width: u32,
    /// Pen colour at recording time.
    pub color: Rgb<u8>,
    /// End cap.
    pub cap: CapStyle,
}

impl StrokeSegment {
    /// Length of the segment in pixels.
    #[must_use]
    pub fn length(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        dx.hypot(dy)
    }
}

/// Pen state applied to newly recorded segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenSettings {
    /// Nominal width in pixels (1..=30 on the stamp surface).
    pub width: u32,
    /// Ink colour.
    pub color: Rgb<u8>,
    /// End cap for new segments.
    pub cap: CapStyle,
    /// Scale each new segment's width by a random factor in `[0.7, 1.3]`.
    pub random_width: bool,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            width: 14,
            color: STAMP_RED,
            cap: CapStyle::Round,
            random_width: false,
        }
    }
}

/// Collects segments from pointer events.
///
/// Generic over the random source so jittered widths are reproducible in
/// tests.
#[derive(Debug)]
pub struct StrokeRecorder<R = ThreadRng> {
    pen: PenSettings,
    last: Option<(f32, f32)>,
    segments: Vec<StrokeSegment>,
    rng: R,
}

impl StrokeRecorder<ThreadRng> {
    /// Create a recorder backed by the thread-local RNG.
    #[must_use]
    pub fn new(pen: PenSettings) -> Self {
        Self::with_rng(pen, rand::rng())
    }
}

impl Default for StrokeRecorder<ThreadRng> {
    fn default() -> Self {
        Self::new(PenSettings::default())
    }
}

impl<R: Rng> StrokeRecorder<R> {
    /// Create a recorder with an explicit random source.
    pub fn with_rng(pen: PenSettings, rng: R) -> Self {
        Self {
            pen,
            last: None,
            segments: Vec::new(),
            rng,
        }
    }

    /// Current pen settings.
    #[must_use]
    pub fn pen(&self) -> &PenSettings {
        &self.pen
    }

    /// Replace the pen settings. Already recorded segments are unaffected.
    pub fn set_pen(&mut self, pen: PenSettings) {
        self.pen = pen;
    }

    /// Pointer pressed at `(x, y)`: start a new stroke.
    pub fn press(&mut self, x: f32, y: f32) {
        self.last = Some((x, y));
    }

    /// Pointer moved to `(x, y)` while pressed.
    ///
    /// Records a segment from the previous position and returns it. Moves
    /// without a preceding [`press`](Self::press) only set the anchor.
    pub fn drag(&mut self, x: f32, y: f32) -> Option<StrokeSegment> {
        let start = self.last.replace((x, y))?;

        let width = self.next_width();
        let segment = StrokeSegment {
            start,
            end: (x, y),
            width,
            color: self.pen.color,
            cap: self.pen.cap,
        };
        self.segments.push(segment);
        Some(segment)
    }

    /// Pointer released: the next drag starts a new stroke.
    pub fn release(&mut self) {
        self.last = None;
    }

    /// Drop every recorded segment.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.last = None;
    }

    /// Recorded segments in drawing order.
    #[must_use]
    pub fn segments(&self) -> &[StrokeSegment] {
        &self.segments
    }

    /// True when nothing has been drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn next_width(&mut self) -> u32 {
        let base = self.pen.width.max(1);
        if !self.pen.random_width {
            return base;
        }
        let factor: f32 = self.rng.random_range(JITTER_MIN..=JITTER_MAX);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let jittered = (base as f32 * factor).floor() as u32;
        jittered.max(1)
    }
}

/// Paint `segment` onto `canvas` in `color`, honouring its width and cap.
///
/// The segment's own colour is ignored so callers can recolour strokes (stamps
/// use a single ink) or paint masks.
pub fn draw_segment<C>(canvas: &mut C, segment: &StrokeSegment, color: C::Pixel)
where
    C: Canvas,
{
    let width = segment.width.max(1);
    #[allow(clippy::cast_precision_loss)]
    let w = width as f32;
    let (x1, y1) = segment.start;
    let (x2, y2) = segment.end;
    let length = segment.length();

    if width == 1 {
        draw_line_segment_mut(canvas, segment.start, segment.end, color);
    } else if length > 0.0 {
        let half = w / 2.0;
        let nx = -(y2 - y1) / length * half;
        let ny = (x2 - x1) / length * half;
        fill_polygon(
            canvas,
            &[
                (x1 + nx, y1 + ny),
                (x2 + nx, y2 + ny),
                (x2 - nx, y2 - ny),
                (x1 - nx, y1 - ny),
            ],
            color,
        );
    }

    match segment.cap {
        CapStyle::Round => {
            #[allow(clippy::cast_possible_wrap)]
            let radius = (width / 2) as i32;
            draw_filled_circle_mut(canvas, round_point(x1, y1), radius, color);
            draw_filled_circle_mut(canvas, round_point(x2, y2), radius, color);
        }
        CapStyle::Pointed => {
            draw_pointed_cap(canvas, segment.start, segment.end, w, color);
            draw_pointed_cap(canvas, segment.end, segment.start, w, color);
        }
        CapStyle::Flat => {}
    }
}

/// Triangle at `cap` pointing away from `other`.
///
/// The base is perpendicular to the segment with half-width `width / 4`;
/// the tip lies `width / 3` beyond `cap`.
fn draw_pointed_cap<C>(
    canvas: &mut C,
    cap: (f32, f32),
    other: (f32, f32),
    width: f32,
    color: C::Pixel,
)
where
    C: Canvas,
{
    let dx = other.0 - cap.0;
    let dy = other.1 - cap.1;
    let length = dx.hypot(dy);
    if length <= 0.0 {
        return;
    }

    let (ux, uy) = (dx / length, dy / length);
    let (px, py) = (-uy * width / 4.0, ux * width / 4.0);
    let tip_length = width / 3.0;
    let tip = (cap.0 - ux * tip_length, cap.1 - uy * tip_length);

    fill_polygon(
        canvas,
        &[(cap.0 + px, cap.1 + py), (cap.0 - px, cap.1 - py), tip],
        color,
    );
}

#[allow(clippy::cast_possible_truncation)]
fn round_point(x: f32, y: f32) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Fill a polygon given in float coordinates.
///
/// Vertices are rounded to the pixel grid; polygons that collapse to fewer
/// than three distinct vertices are drawn as a line or a single pixel, since
/// `draw_polygon_mut` rejects them.
pub(crate) fn fill_polygon<C>(canvas: &mut C, vertices: &[(f32, f32)], color: C::Pixel)
where
    C: Canvas,
{
    let mut points: Vec<Point<i32>> = Vec::with_capacity(vertices.len());
    for &(x, y) in vertices {
        let (px, py) = round_point(x, y);
        let p = Point::new(px, py);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    match points.len() {
        0 => {}
        1 => {
            let p = points[0];
            let (w, h) = canvas.dimensions();
            if let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y)) {
                if x < w && y < h {
                    canvas.draw_pixel(x, y, color);
                }
            }
        }
        2 => {
            let first = points[0];
            let last = points[points.len() - 1];
            #[allow(clippy::cast_precision_loss)]
            draw_line_segment_mut(
                canvas,
                (first.x as f32, first.y as f32),
                (last.x as f32, last.y as f32),
                color,
            );
        }
        _ => draw_polygon_mut(canvas, &points, color),
    }
}

/// Render a handwritten signature: every segment in its own pen colour on a
/// transparent `width` x `height` canvas.
///
/// # Errors
///
/// Returns [`Error::NothingToCompose`] when `strokes` is empty.
pub fn render_signature(strokes: &[StrokeSegment], width: u32, height: u32) -> Result<RgbaImage> {
    if strokes.is_empty() {
        return Err(Error::NothingToCompose);
    }

    let mut canvas = RgbaImage::new(width, height);
    for segment in strokes {
        let [r, g, b] = segment.color.0;
        draw_segment(&mut canvas, segment, Rgba([r, g, b, u8::MAX]));
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn segment(start: (f32, f32), end: (f32, f32), width: u32, cap: CapStyle) -> StrokeSegment {
        StrokeSegment {
            start,
            end,
            width,
            color: STAMP_RED,
            cap,
        }
    }

    fn set(mask: &GrayImage, x: u32, y: u32) -> bool {
        mask.get_pixel(x, y)[0] > 0
    }

    #[test]
    fn recorder_turns_drags_into_segments() {
        let mut rec = StrokeRecorder::default();
        assert!(rec.drag(5.0, 5.0).is_none(), "drag without press records nothing");
        rec.release();

        rec.press(10.0, 10.0);
        let first = rec.drag(20.0, 10.0).unwrap();
        assert_eq!(first.start, (10.0, 10.0));
        assert_eq!(first.end, (20.0, 10.0));
        assert_eq!(first.width, 14);
        rec.drag(20.0, 30.0);
        rec.release();
        assert!(rec.drag(0.0, 0.0).is_none());

        assert_eq!(rec.segments().len(), 2);
        assert_eq!(rec.segments()[1].start, (20.0, 10.0));
    }

    #[test]
    fn pen_changes_apply_only_to_new_segments() {
        let mut rec = StrokeRecorder::default();
        rec.press(0.0, 0.0);
        rec.drag(1.0, 1.0);
        rec.set_pen(PenSettings {
            width: 3,
            cap: CapStyle::Pointed,
            ..PenSettings::default()
        });
        rec.drag(2.0, 2.0);
        assert_eq!(rec.segments()[0].width, 14);
        assert_eq!(rec.segments()[0].cap, CapStyle::Round);
        assert_eq!(rec.segments()[1].width, 3);
        assert_eq!(rec.segments()[1].cap, CapStyle::Pointed);
    }

    #[test]
    fn random_width_stays_in_range_and_varies() {
        let pen = PenSettings {
            width: 20,
            random_width: true,
            ..PenSettings::default()
        };
        let mut rec = StrokeRecorder::with_rng(pen, StdRng::seed_from_u64(7));
        rec.press(0.0, 0.0);
        for i in 1..=200 {
            #[allow(clippy::cast_precision_loss)]
            rec.drag(i as f32, 0.0);
        }
        let widths: Vec<u32> = rec.segments().iter().map(|s| s.width).collect();
        assert!(widths.iter().all(|&w| (14..=26).contains(&w)), "{widths:?}");
        assert!(widths.iter().any(|&w| w != widths[0]));
    }

    #[test]
    fn jitter_never_drops_below_one_pixel() {
        let pen = PenSettings {
            width: 1,
            random_width: true,
            ..PenSettings::default()
        };
        let mut rec = StrokeRecorder::with_rng(pen, StdRng::seed_from_u64(1));
        rec.press(0.0, 0.0);
        for _ in 0..50 {
            rec.drag(3.0, 3.0);
        }
        assert!(rec.segments().iter().all(|s| s.width >= 1));
    }

    #[test]
    fn clear_drops_segments_and_anchor() {
        let mut rec = StrokeRecorder::default();
        rec.press(0.0, 0.0);
        rec.drag(4.0, 4.0);
        rec.clear();
        assert!(rec.is_empty());
        assert!(rec.drag(8.0, 8.0).is_none());
    }

    #[test]
    fn round_caps_extend_past_endpoints() {
        let mut mask = GrayImage::new(60, 20);
        let seg = segment((10.0, 10.0), (50.0, 10.0), 6, CapStyle::Round);
        draw_segment(&mut mask, &seg, Luma([255]));
        assert!(set(&mask, 30, 10));
        assert!(set(&mask, 30, 8));
        assert!(set(&mask, 8, 10));
        assert!(set(&mask, 52, 10));
        assert!(!set(&mask, 30, 2));
        assert!(!set(&mask, 30, 17));
        assert!(!set(&mask, 5, 10));
        assert!(!set(&mask, 55, 10));
    }

    #[test]
    fn flat_caps_stop_at_endpoints() {
        let mut mask = GrayImage::new(60, 20);
        let seg = segment((10.0, 10.0), (50.0, 10.0), 6, CapStyle::Flat);
        draw_segment(&mut mask, &seg, Luma([255]));
        assert!(set(&mask, 30, 10));
        assert!(set(&mask, 10, 10));
        assert!(!set(&mask, 7, 10));
        assert!(!set(&mask, 53, 10));
    }

    #[test]
    fn pointed_caps_add_a_spike() {
        let mut mask = GrayImage::new(80, 20);
        draw_segment(
            &mut mask,
            &segment((20.0, 10.0), (60.0, 10.0), 12, CapStyle::Pointed),
            Luma([255]),
        );
        // The tip reaches width / 3 = 4 pixels past each end along the axis.
        assert!(set(&mask, 17, 10));
        assert!(set(&mask, 63, 10));
        assert!(!set(&mask, 13, 10));
        assert!(!set(&mask, 67, 10));
        // Beside the tip, outside the triangle and the body, stays clear.
        assert!(!set(&mask, 17, 5));
    }

    #[test]
    fn zero_length_round_segment_is_a_dot() {
        let mut mask = GrayImage::new(20, 20);
        let seg = segment((10.0, 10.0), (10.0, 10.0), 6, CapStyle::Round);
        draw_segment(&mut mask, &seg, Luma([255]));
        assert!(set(&mask, 10, 10));
        assert!(set(&mask, 12, 10));
        assert!(!set(&mask, 15, 10));
    }

    #[test]
    fn hairline_segment_is_drawn() {
        let mut mask = GrayImage::new(20, 20);
        draw_segment(&mut mask, &segment((2.0, 5.0), (15.0, 5.0), 1, CapStyle::Flat), Luma([255]));
        assert!(set(&mask, 8, 5));
        assert!(!set(&mask, 8, 6));
    }

    #[test]
    fn degenerate_polygon_falls_back_to_a_line() {
        let mut mask = GrayImage::new(10, 10);
        fill_polygon(&mut mask, &[(2.0, 2.0), (2.2, 2.1), (6.0, 2.0)], Luma([255]));
        assert!(set(&mask, 4, 2));
        fill_polygon(&mut mask, &[(8.0, 8.0), (8.0, 8.0), (8.0, 8.0)], Luma([255]));
        assert!(set(&mask, 8, 8));
    }

    #[test]
    fn signature_uses_each_segment_colour() {
        let navy = Rgb([0, 0, 128]);
        let strokes = [
            segment((5.0, 5.0), (25.0, 5.0), 3, CapStyle::Round),
            StrokeSegment {
                color: navy,
                ..segment((5.0, 15.0), (25.0, 15.0), 3, CapStyle::Round)
            },
        ];
        let img = render_signature(&strokes, 30, 20).unwrap();
        assert_eq!(img.get_pixel(15, 5), &Rgba([0xCC, 0, 0, 255]));
        assert_eq!(img.get_pixel(15, 15), &Rgba([0, 0, 128, 255]));
        assert_eq!(img.get_pixel(15, 10)[3], 0);
    }

    #[test]
    fn empty_signature_is_refused() {
        assert!(matches!(render_signature(&[], 10, 10), Err(Error::NothingToCompose)));
    }
}
