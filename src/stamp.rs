//! Stamp composition from recorded strokes.
//!
//! A stamp is a square RGBA canvas holding a border and the user's strokes,
//! all in one ink colour. [`CarvingMode::Intaglio`] inverts the result: the
//! border silhouette is filled with ink and every border or stroke pixel is
//! punched transparent, like a seal carved into the stone rather than raised
//! from it.

use std::fmt;
use std::str::FromStr;

use image::{imageops, GrayImage, Luma, Rgb, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use log::debug;

use crate::color::{GUIDE_GRAY, STAMP_RED};
use crate::error::{Error, Result};
use crate::shape::BorderShape;
use crate::stroke::{draw_segment, StrokeSegment};

/// Inset of the guide grid from the canvas edge.
const GRID_MARGIN: f32 = 25.0;
/// Gap between a Korean-cross arm and its cell edge.
const CROSS_INSET: f32 = 10.0;
/// Dash and gap length of dotted guide lines.
const DASH: f32 = 3.0;

/// Thickest border outline drawn.
const MAX_BORDER_THICKNESS: u32 = 20;

/// Fully transparent white, the background of a fresh stamp canvas.
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// How strokes and border relate to the ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarvingMode {
    /// Strokes and border are ink on a transparent field.
    #[default]
    None,
    /// Raised carving. Renders the same as [`CarvingMode::None`].
    Relief,
    /// Sunken carving: the silhouette is ink, strokes and border are holes.
    Intaglio,
}

/// Guide lines shown on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridGuide {
    /// No grid.
    None,
    /// A `rows` x `cols` grid of equal cells.
    Cells {
        /// Number of rows, at least 1.
        rows: u32,
        /// Number of columns, at least 1.
        cols: u32,
    },
    /// 2x2 cells, each with a dotted centre cross, for laying out four
    /// Hangul syllables.
    #[default]
    KoreanCross,
}

impl FromStr for GridGuide {
    type Err = Error;

    /// Parse `none`, `korean-cross`, or `RxC` such as `2x3`.
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_ascii_lowercase();
        match text.as_str() {
            "none" => return Ok(Self::None),
            "korean-cross" | "cross" => return Ok(Self::KoreanCross),
            _ => {}
        }

        let invalid = || Error::InvalidGrid(s.to_string());
        let (rows, cols) = text.split_once('x').ok_or_else(invalid)?;
        let rows: u32 = rows.trim().parse().map_err(|_| invalid())?;
        let cols: u32 = cols.trim().parse().map_err(|_| invalid())?;
        if rows == 0 || cols == 0 {
            return Err(invalid());
        }
        Ok(Self::Cells { rows, cols })
    }
}

impl fmt::Display for GridGuide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Cells { rows, cols } => write!(f, "{rows}x{cols}"),
            Self::KoreanCross => f.write_str("korean-cross"),
        }
    }
}

/// Everything that shapes a stamp besides the strokes themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct StampConfig {
    /// Side of the square canvas in pixels.
    pub size: u32,
    /// Border outline.
    pub border: BorderShape,
    /// Border thickness in pixels, capped at 20. Zero draws no outline.
    pub border_thickness: u32,
    /// Drawing-surface grid.
    pub grid: GridGuide,
    /// Whether [`render_guides`] draws anything.
    pub show_guides: bool,
    /// Final ink colour; strokes are recoloured to it.
    pub color: Rgb<u8>,
    /// Carving mode.
    pub carving: CarvingMode,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            size: 300,
            border: BorderShape::Rectangle,
            border_thickness: 8,
            grid: GridGuide::KoreanCross,
            show_guides: true,
            color: STAMP_RED,
            carving: CarvingMode::None,
        }
    }
}

impl StampConfig {
    fn ink(&self) -> Rgba<u8> {
        let [r, g, b] = self.color.0;
        Rgba([r, g, b, u8::MAX])
    }

    fn thickness(&self) -> u32 {
        self.border_thickness.min(MAX_BORDER_THICKNESS)
    }
}

/// Compose the final stamp.
///
/// # Errors
///
/// Returns [`Error::NothingToCompose`] when no strokes were drawn.
pub fn compose_stamp(strokes: &[StrokeSegment], config: &StampConfig) -> Result<RgbaImage> {
    if strokes.is_empty() {
        return Err(Error::NothingToCompose);
    }
    debug!(
        "composing {} segments: border={:?}, carving={:?}",
        strokes.len(),
        config.border,
        config.carving
    );

    let mut stamp = RgbaImage::from_pixel(config.size, config.size, CLEAR);
    let ink = config.ink();

    match config.carving {
        CarvingMode::None | CarvingMode::Relief => {
            config.border.outline(&mut stamp, config.thickness(), ink);
            for segment in strokes {
                draw_segment(&mut stamp, segment, ink);
            }
        }
        CarvingMode::Intaglio => {
            config.border.fill(&mut stamp, ink);
            let mask = carve_mask(strokes, config);
            punch(&mut stamp, &mask);
        }
    }
    Ok(stamp)
}

/// Single-channel mask of everything the intaglio pass cuts away: the border
/// outline and every stroke, at full intensity.
#[must_use]
pub fn carve_mask(strokes: &[StrokeSegment], config: &StampConfig) -> GrayImage {
    let mut mask = GrayImage::new(config.size, config.size);
    let cut = Luma([u8::MAX]);
    config.border.outline(&mut mask, config.thickness(), cut);
    for segment in strokes {
        draw_segment(&mut mask, segment, cut);
    }
    mask
}

/// Force alpha to 0 wherever `mask` is non-zero.
fn punch(img: &mut RgbaImage, mask: &GrayImage) {
    for (px, m) in img.pixels_mut().zip(mask.pixels()) {
        if m[0] > 0 {
            px[3] = 0;
        }
    }
}

/// Transparent overlay with the drawing-surface guides: the border at its
/// configured thickness and the grid, both in light gray.
///
/// Returns a blank overlay when `config.show_guides` is off.
#[must_use]
pub fn render_guides(config: &StampConfig) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(config.size, config.size, CLEAR);
    if !config.show_guides {
        return overlay;
    }

    let [r, g, b] = GUIDE_GRAY.0;
    let guide = Rgba([r, g, b, u8::MAX]);
    config.border.outline(&mut overlay, config.thickness(), guide);

    #[allow(clippy::cast_precision_loss)]
    let size = config.size as f32;
    let span = size - 2.0 * GRID_MARGIN;
    let far = size - GRID_MARGIN;

    match config.grid {
        GridGuide::None => {}
        GridGuide::Cells { rows, cols } => {
            #[allow(clippy::cast_precision_loss)]
            let (cell_w, cell_h) = (span / cols.max(1) as f32, span / rows.max(1) as f32);
            for i in 1..cols {
                #[allow(clippy::cast_precision_loss)]
                let x = GRID_MARGIN + i as f32 * cell_w;
                draw_line_segment_mut(&mut overlay, (x, GRID_MARGIN), (x, far), guide);
            }
            for i in 1..rows {
                #[allow(clippy::cast_precision_loss)]
                let y = GRID_MARGIN + i as f32 * cell_h;
                draw_line_segment_mut(&mut overlay, (GRID_MARGIN, y), (far, y), guide);
            }
        }
        GridGuide::KoreanCross => {
            let cell = span / 2.0;
            for row in 0..2_u8 {
                for col in 0..2_u8 {
                    let left = GRID_MARGIN + f32::from(col) * cell;
                    let top = GRID_MARGIN + f32::from(row) * cell;
                    let (cx, cy) = (left + cell / 2.0, top + cell / 2.0);
                    draw_dotted_line(
                        &mut overlay,
                        (cx, top + CROSS_INSET),
                        (cx, top + cell - CROSS_INSET),
                        guide,
                    );
                    draw_dotted_line(
                        &mut overlay,
                        (left + CROSS_INSET, cy),
                        (left + cell - CROSS_INSET, cy),
                        guide,
                    );
                }
            }
            let mid = GRID_MARGIN + cell;
            draw_line_segment_mut(&mut overlay, (mid, GRID_MARGIN), (mid, far), guide);
            draw_line_segment_mut(&mut overlay, (GRID_MARGIN, mid), (far, mid), guide);
        }
    }
    overlay
}

/// The stamp drawn over its guides, as shown on the drawing surface.
///
/// # Errors
///
/// Returns [`Error::NothingToCompose`] when no strokes were drawn.
pub fn preview(strokes: &[StrokeSegment], config: &StampConfig) -> Result<RgbaImage> {
    let stamp = compose_stamp(strokes, config)?;
    let mut surface = render_guides(config);
    imageops::overlay(&mut surface, &stamp, 0, 0);
    Ok(surface)
}

/// Dotted line of 3-pixel dashes separated by 3-pixel gaps.
fn draw_dotted_line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let distance = dx.hypot(dy);
    if distance <= 0.0 {
        return;
    }

    let period = DASH * 2.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let dashes = (distance / period) as u32;
    for i in 0..dashes {
        #[allow(clippy::cast_precision_loss)]
        let offset = i as f32 * period;
        let t1 = offset / distance;
        let t2 = ((offset + DASH) / distance).min(1.0);
        draw_line_segment_mut(
            img,
            (from.0 + t1 * dx, from.1 + t1 * dy),
            (from.0 + t2 * dx, from.1 + t2 * dy),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::CapStyle;

    fn band() -> StrokeSegment {
        StrokeSegment {
            start: (10.0, 10.0),
            end: (50.0, 10.0),
            width: 6,
            color: Rgb([0, 0, 0]),
            cap: CapStyle::Round,
        }
    }

    fn borderless(carving: CarvingMode) -> StampConfig {
        StampConfig {
            border: BorderShape::None,
            carving,
            ..StampConfig::default()
        }
    }

    #[test]
    fn empty_strokes_are_refused() {
        let result = compose_stamp(&[], &StampConfig::default());
        assert!(matches!(result, Err(Error::NothingToCompose)));
    }

    #[test]
    fn plain_stroke_is_ink_on_transparent() {
        let stamp = compose_stamp(&[band()], &borderless(CarvingMode::None)).unwrap();
        assert_eq!(stamp.dimensions(), (300, 300));
        assert_eq!(stamp.get_pixel(30, 10), &Rgba([0xCC, 0, 0, 255]));
        assert_eq!(stamp.get_pixel(8, 10)[3], 255, "round cap at the start");
        assert_eq!(stamp.get_pixel(52, 10)[3], 255, "round cap at the end");
        assert_eq!(stamp.get_pixel(30, 20)[3], 0);
        assert_eq!(stamp.get_pixel(150, 150)[3], 0);
    }

    #[test]
    fn relief_matches_plain() {
        let config = StampConfig {
            carving: CarvingMode::Relief,
            ..StampConfig::default()
        };
        let relief = compose_stamp(&[band()], &config).unwrap();
        let plain = compose_stamp(
            &[band()],
            &StampConfig {
                carving: CarvingMode::None,
                ..config
            },
        )
        .unwrap();
        assert_eq!(relief, plain);
    }

    #[test]
    fn border_is_drawn_in_stamp_colour() {
        let config = StampConfig {
            color: Rgb([0, 0, 200]),
            ..StampConfig::default()
        };
        let stamp = compose_stamp(&[band()], &config).unwrap();
        assert_eq!(stamp.get_pixel(12, 150), &Rgba([0, 0, 200, 255]));
        assert_eq!(stamp.get_pixel(150, 150)[3], 0);
    }

    #[test]
    fn zero_thickness_draws_no_border() {
        let config = StampConfig {
            border_thickness: 0,
            ..StampConfig::default()
        };
        let stamp = compose_stamp(&[band()], &config).unwrap();
        assert_eq!(stamp.get_pixel(10, 150)[3], 0);
        assert_eq!(stamp.get_pixel(30, 10)[3], 255, "strokes still drawn");

        let intaglio = StampConfig {
            carving: CarvingMode::Intaglio,
            ..config
        };
        let mask = carve_mask(&[band()], &intaglio);
        assert_eq!(mask.get_pixel(10, 150)[0], 0);
    }

    #[test]
    fn thickness_is_capped() {
        let config = StampConfig {
            border_thickness: 50,
            ..StampConfig::default()
        };
        let stamp = compose_stamp(&[band()], &config).unwrap();
        assert_eq!(stamp.get_pixel(29, 150)[3], 255);
        assert_eq!(stamp.get_pixel(31, 150)[3], 0);
    }

    #[test]
    fn intaglio_inverts_coverage() {
        let strokes = [band()];
        let config = borderless(CarvingMode::Intaglio);
        let stamp = compose_stamp(&strokes, &config).unwrap();
        let mask = carve_mask(&strokes, &config);

        for ((x, y, px), m) in stamp.enumerate_pixels().zip(mask.pixels()) {
            if m[0] > 0 {
                assert_eq!(px[3], 0, "covered pixel ({x},{y}) must be punched");
            } else {
                assert_eq!(px, &Rgba([0xCC, 0, 0, 255]), "pixel ({x},{y})");
            }
        }
        assert_eq!(stamp.get_pixel(30, 10)[3], 0);
        assert_eq!(stamp.get_pixel(150, 150), &Rgba([0xCC, 0, 0, 255]));
    }

    #[test]
    fn intaglio_with_border_keeps_outside_transparent() {
        let config = StampConfig {
            border: BorderShape::Circle,
            carving: CarvingMode::Intaglio,
            ..StampConfig::default()
        };
        let stroke = StrokeSegment {
            start: (100.0, 150.0),
            end: (200.0, 150.0),
            ..band()
        };
        let stamp = compose_stamp(&[stroke], &config).unwrap();
        assert_eq!(stamp.get_pixel(2, 2)[3], 0, "outside the silhouette");
        assert_eq!(stamp.get_pixel(12, 150)[3], 0, "border ring is cut");
        assert_eq!(stamp.get_pixel(150, 150)[3], 0, "stroke is cut");
        assert_eq!(stamp.get_pixel(150, 100)[3], 255, "field stays ink");
    }

    #[test]
    fn grid_guides_parse_and_display() {
        assert_eq!("2x3".parse::<GridGuide>().unwrap(), GridGuide::Cells { rows: 2, cols: 3 });
        assert_eq!("4X1".parse::<GridGuide>().unwrap(), GridGuide::Cells { rows: 4, cols: 1 });
        assert_eq!("none".parse::<GridGuide>().unwrap(), GridGuide::None);
        assert_eq!("korean-cross".parse::<GridGuide>().unwrap(), GridGuide::KoreanCross);
        assert!(matches!("0x2".parse::<GridGuide>(), Err(Error::InvalidGrid(_))));
        assert!("three".parse::<GridGuide>().is_err());
        assert_eq!(GridGuide::Cells { rows: 1, cols: 4 }.to_string(), "1x4");
    }

    #[test]
    fn cell_grid_draws_interior_lines_only() {
        let config = StampConfig {
            border: BorderShape::None,
            grid: GridGuide::Cells { rows: 1, cols: 2 },
            ..StampConfig::default()
        };
        let overlay = render_guides(&config);
        assert_eq!(overlay.get_pixel(150, 100)[3], 255, "vertical divider");
        assert_eq!(overlay.get_pixel(100, 150)[3], 0, "no horizontal divider for one row");
        assert_eq!(overlay.get_pixel(25, 100)[3], 0, "outer edge is not a grid line");
    }

    #[test]
    fn korean_cross_has_dividers_and_dotted_arms() {
        let config = StampConfig {
            border: BorderShape::None,
            ..StampConfig::default()
        };
        let overlay = render_guides(&config);
        assert_eq!(overlay.get_pixel(150, 60)[3], 255, "vertical divider");
        assert_eq!(overlay.get_pixel(60, 150)[3], 255, "horizontal divider");
        // Cell (0, 0) spans 25..150; its vertical arm runs at x = 87.5.
        let arm: Vec<u8> = (35..60).map(|y| overlay.get_pixel(88, y)[3]).collect();
        assert!(arm.contains(&255) && arm.contains(&0), "arm must be dotted: {arm:?}");
    }

    #[test]
    fn guides_can_be_hidden() {
        let config = StampConfig {
            show_guides: false,
            ..StampConfig::default()
        };
        assert!(render_guides(&config).pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn guided_preview_puts_ink_over_guides() {
        let config = StampConfig::default();
        let stroke = StrokeSegment {
            start: (100.0, 100.0),
            end: (140.0, 100.0),
            ..band()
        };
        let preview = preview(&[stroke], &config).unwrap();
        assert_eq!(preview.get_pixel(120, 100), &Rgba([0xCC, 0, 0, 255]));
        assert_eq!(preview.get_pixel(150, 60), &Rgba([0xCC, 0xCC, 0xCC, 255]));
    }
}
