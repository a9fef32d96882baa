//! Loading sources and writing results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, Rgb, RgbImage, RgbaImage};
use log::info;

use crate::error::{Error, Result};

/// JPEG quality used for every JPEG export.
pub const JPEG_QUALITY: u8 = 95;

/// Decode a source photo and drop any alpha channel.
///
/// The format is sniffed from the file contents, so a mislabelled extension
/// still loads.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened and [`Error::Image`] if
/// it cannot be decoded.
pub fn load_source(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgb8())
}

/// Whether the format can carry an alpha channel on export.
#[must_use]
pub fn supports_alpha(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Tiff | ImageFormat::WebP)
}

fn output_format(path: &Path) -> Result<ImageFormat> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    match format {
        ImageFormat::Png
        | ImageFormat::Tiff
        | ImageFormat::WebP
        | ImageFormat::Jpeg
        | ImageFormat::Bmp => Ok(format),
        other => Err(Error::UnsupportedFormat(format!("{other:?}"))),
    }
}

/// Save an RGBA result, picking the format from the file extension.
///
/// PNG, TIFF and WebP keep the alpha channel. JPEG and BMP are flattened onto
/// white first; JPEG is written at quality [`JPEG_QUALITY`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for any other extension, or an I/O or
/// encoding error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format = output_format(path)?;
    if supports_alpha(format) {
        write_file(path, |out| DynamicImage::ImageRgba8(img.clone()).write_to(out, format))?;
        info!(
            "saved {}x{} RGBA image to {}",
            img.width(),
            img.height(),
            path.display()
        );
        Ok(())
    } else {
        write_opaque(&flatten_onto_white(img), path, format)
    }
}

/// Save an RGBA result flattened onto a white background.
///
/// # Errors
///
/// Same as [`save_image`].
pub fn save_flattened(img: &RgbaImage, path: &Path) -> Result<()> {
    let format = output_format(path)?;
    write_opaque(&flatten_onto_white(img), path, format)
}

fn write_opaque(img: &RgbImage, path: &Path, format: ImageFormat) -> Result<()> {
    write_file(path, |out| match format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(out, JPEG_QUALITY).encode_image(img),
        _ => DynamicImage::ImageRgb8(img.clone()).write_to(out, format),
    })?;
    info!(
        "saved {}x{} image on white to {}",
        img.width(),
        img.height(),
        path.display()
    );
    Ok(())
}

/// Create `path`, run `encode` against a buffered writer, then flush.
///
/// Encoder I/O failures surface as [`Error::Io`], the same as a failed flush.
fn write_file<F>(path: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::result::Result<(), ImageError>,
{
    let mut out = BufWriter::new(File::create(path)?);
    encode(&mut out).map_err(|e| match e {
        ImageError::IoError(io) => Error::Io(io),
        other => Error::Image(other),
    })?;
    out.flush()?;
    Ok(())
}

/// Composite `img` over opaque white.
///
/// Each channel becomes `round(c * a / 255 + 255 * (1 - a / 255))`.
#[must_use]
pub fn flatten_onto_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = u32::from(a);
        let blend = |c: u8| {
            let v = (u32::from(c) * a + 255 * (255 - a) + 127) / 255;
            #[allow(clippy::cast_possible_truncation)]
            let v = v.min(255) as u8;
            v
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}
