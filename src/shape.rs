//! Stamp border geometry.
//!
//! Every border sits inside a box inset [`MARGIN`] pixels from the canvas
//! edge. Shapes are rasterised with a per-pixel coverage test, which keeps
//! outline bands exact for any thickness and lets the same geometry drive the
//! outline, the filled silhouette and the intaglio mask.

use imageproc::drawing::Canvas;

/// Inset of the border box from the canvas edge.
pub const MARGIN: f32 = 10.0;
/// Extra horizontal inset of [`BorderShape::Ellipse`].
pub const ELLIPSE_INSET: f32 = 20.0;
/// Extra horizontal inset of [`BorderShape::ElongatedEllipse`].
pub const ELONGATED_INSET: f32 = 40.0;
/// Corner radius of [`BorderShape::RoundedRectangle`].
pub const CORNER_RADIUS: f32 = 20.0;

/// Outline shape drawn around a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderShape {
    /// Square-cornered box.
    #[default]
    Rectangle,
    /// Circle (an ellipse filling the border box).
    Circle,
    /// Ellipse narrowed by 20 pixels on each side.
    Ellipse,
    /// Ellipse narrowed by 40 pixels on each side.
    ElongatedEllipse,
    /// Box with 20-pixel rounded corners.
    RoundedRectangle,
    /// No border.
    None,
}

/// Axis-aligned box with inclusive pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Bounds {
    fn inset(self, dx: f32, dy: f32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 - dx,
            y1: self.y1 - dy,
        }
    }

    fn is_empty(self) -> bool {
        self.x1 < self.x0 || self.y1 < self.y0
    }

    fn contains(self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    fn contains_ellipse(self, x: f32, y: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let rx = (self.x1 - self.x0) / 2.0;
        let ry = (self.y1 - self.y0) / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return self.contains(x, y);
        }
        let nx = (x - (self.x0 + rx)) / rx;
        let ny = (y - (self.y0 + ry)) / ry;
        nx * nx + ny * ny <= 1.0
    }

    fn contains_rounded(self, x: f32, y: f32, radius: f32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        let r = radius
            .min((self.x1 - self.x0) / 2.0)
            .min((self.y1 - self.y0) / 2.0)
            .max(0.0);
        let cx = x.clamp(self.x0 + r, self.x1 - r);
        let cy = y.clamp(self.y0 + r, self.y1 - r);
        (x - cx).hypot(y - cy) <= r
    }
}

impl BorderShape {
    /// The border box for a `width` x `height` canvas, after the shape's own
    /// horizontal inset.
    fn bounds(self, width: u32, height: u32) -> Bounds {
        #[allow(clippy::cast_precision_loss)]
        let full = Bounds {
            x0: MARGIN,
            y0: MARGIN,
            x1: width as f32 - MARGIN,
            y1: height as f32 - MARGIN,
        };
        match self {
            Self::Ellipse => full.inset(ELLIPSE_INSET, 0.0),
            Self::ElongatedEllipse => full.inset(ELONGATED_INSET, 0.0),
            _ => full,
        }
    }

    fn covers(self, bounds: Bounds, x: f32, y: f32, radius: f32) -> bool {
        match self {
            Self::Rectangle => bounds.contains(x, y),
            Self::Circle | Self::Ellipse | Self::ElongatedEllipse => bounds.contains_ellipse(x, y),
            Self::RoundedRectangle => bounds.contains_rounded(x, y, radius),
            Self::None => false,
        }
    }

    /// Whether pixel `(x, y)` lies inside the filled silhouette.
    ///
    /// With [`BorderShape::None`] the silhouette is the whole canvas.
    #[must_use]
    pub fn fill_covers(self, width: u32, height: u32, x: u32, y: u32) -> bool {
        if self == Self::None {
            return x < width && y < height;
        }
        #[allow(clippy::cast_precision_loss)]
        let (px, py) = (x as f32, y as f32);
        self.covers(self.bounds(width, height), px, py, CORNER_RADIUS)
    }

    /// Whether pixel `(x, y)` lies on the outline band of `thickness` pixels,
    /// measured inward from the shape edge.
    #[must_use]
    pub fn outline_covers(self, width: u32, height: u32, thickness: u32, x: u32, y: u32) -> bool {
        if self == Self::None || thickness == 0 {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let (px, py, t) = (x as f32, y as f32, thickness as f32);
        let outer = self.bounds(width, height);
        let inner = outer.inset(t, t);
        self.covers(outer, px, py, CORNER_RADIUS)
            && !self.covers(inner, px, py, (CORNER_RADIUS - t).max(0.0))
    }

    /// Paint the filled silhouette onto `canvas`.
    pub fn fill<C: Canvas>(self, canvas: &mut C, color: C::Pixel) {
        let (w, h) = canvas.dimensions();
        paint_where(canvas, color, |x, y| self.fill_covers(w, h, x, y));
    }

    /// Paint the outline band onto `canvas`.
    pub fn outline<C: Canvas>(self, canvas: &mut C, thickness: u32, color: C::Pixel) {
        if self == Self::None {
            return;
        }
        let (w, h) = canvas.dimensions();
        paint_where(canvas, color, |x, y| self.outline_covers(w, h, thickness, x, y));
    }
}

fn paint_where<C: Canvas>(canvas: &mut C, color: C::Pixel, covered: impl Fn(u32, u32) -> bool) {
    let (w, h) = canvas.dimensions();
    for y in 0..h {
        for x in 0..w {
            if covered(x, y) {
                canvas.draw_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    const SIZE: u32 = 300;

    fn outlined(shape: BorderShape, thickness: u32) -> GrayImage {
        let mut mask = GrayImage::new(SIZE, SIZE);
        shape.outline(&mut mask, thickness, Luma([255]));
        mask
    }

    #[test]
    fn rectangle_outline_is_an_inward_band() {
        let mask = outlined(BorderShape::Rectangle, 8);
        assert_eq!(mask.get_pixel(10, 150)[0], 255);
        assert_eq!(mask.get_pixel(17, 150)[0], 255);
        assert_eq!(mask.get_pixel(19, 150)[0], 0);
        assert_eq!(mask.get_pixel(9, 150)[0], 0);
        assert_eq!(mask.get_pixel(150, 150)[0], 0);
        assert_eq!(mask.get_pixel(290, 290)[0], 255);
    }

    #[test]
    fn circle_outline_touches_box_midpoints_only() {
        let mask = outlined(BorderShape::Circle, 4);
        assert_eq!(mask.get_pixel(150, 11)[0], 255);
        assert_eq!(mask.get_pixel(11, 150)[0], 255);
        assert_eq!(mask.get_pixel(11, 11)[0], 0, "corner is outside the circle");
        assert_eq!(mask.get_pixel(150, 150)[0], 0);
    }

    #[test]
    fn ellipses_are_narrowed_horizontally() {
        let ellipse = outlined(BorderShape::Ellipse, 3);
        assert_eq!(ellipse.get_pixel(15, 150)[0], 0);
        assert_eq!(ellipse.get_pixel(31, 150)[0], 255);

        let elongated = outlined(BorderShape::ElongatedEllipse, 3);
        assert_eq!(elongated.get_pixel(31, 150)[0], 0);
        assert_eq!(elongated.get_pixel(51, 150)[0], 255);
        assert_eq!(elongated.get_pixel(150, 11)[0], 255);
    }

    #[test]
    fn rounded_rectangle_cuts_corners() {
        let rounded = outlined(BorderShape::RoundedRectangle, 5);
        assert_eq!(rounded.get_pixel(11, 11)[0], 0);
        assert_eq!(rounded.get_pixel(11, 150)[0], 255);

        let square = outlined(BorderShape::Rectangle, 5);
        assert_eq!(square.get_pixel(11, 11)[0], 255);
    }

    #[test]
    fn none_draws_no_outline_and_fills_everything() {
        let mask = outlined(BorderShape::None, 8);
        assert!(mask.pixels().all(|p| p[0] == 0));

        let mut fill = GrayImage::new(20, 20);
        BorderShape::None.fill(&mut fill, Luma([255]));
        assert!(fill.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn fill_matches_silhouette() {
        let mut fill = GrayImage::new(SIZE, SIZE);
        BorderShape::Circle.fill(&mut fill, Luma([255]));
        assert_eq!(fill.get_pixel(150, 150)[0], 255);
        assert_eq!(fill.get_pixel(12, 12)[0], 0);
        assert_eq!(fill.get_pixel(5, 150)[0], 0);
    }

    #[test]
    fn tiny_canvas_does_not_panic() {
        let mut mask = GrayImage::new(8, 8);
        BorderShape::RoundedRectangle.outline(&mut mask, 4, Luma([255]));
        BorderShape::Ellipse.fill(&mut mask, Luma([255]));
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
