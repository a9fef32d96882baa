//! Digital signature and stamp images.
//!
//! Two pipelines produce transparent RGBA images:
//!
//! - **Background removal** turns a photo or scan of a signature on white
//!   paper into an image whose paper is transparent, either by chroma-keying
//!   white and gray shadow pixels or by extracting dark ink lines against
//!   their local neighbourhood.
//! - **Stamp composition** turns freehand pointer strokes into a stamp with a
//!   border, in a single ink colour, optionally carved in intaglio.
//!
//! Results are exported as PNG (alpha kept) or JPEG flattened onto white.
//!
//! # Quick Start
//!
//! ```no_run
//! use sigstamp::{remove_background, save_image, RemovalParams};
//!
//! let photo = image::open("signature.jpg").unwrap().to_rgb8();
//! let params = RemovalParams { line_only: false, ..RemovalParams::default() };
//! let cut = remove_background(&photo, &params);
//! save_image(&cut, std::path::Path::new("signature.png")).unwrap();
//! ```
//!
//! # Stamps
//!
//! ```
//! use sigstamp::{compose_stamp, BorderShape, CarvingMode, StampConfig, StrokeRecorder};
//!
//! let mut pen = StrokeRecorder::default();
//! pen.press(80.0, 150.0);
//! pen.drag(220.0, 150.0);
//! pen.release();
//!
//! let config = StampConfig {
//!     border: BorderShape::Circle,
//!     carving: CarvingMode::Intaglio,
//!     ..StampConfig::default()
//! };
//! let stamp = compose_stamp(pen.segments(), &config).unwrap();
//! assert_eq!(stamp.dimensions(), (300, 300));
//! ```

#![deny(missing_docs)]

pub mod adjust;
pub mod alpha;
pub mod color;
mod engine;
pub mod error;
pub mod export;
pub mod mask;
pub mod noise;
pub mod session;
pub mod shape;
pub mod stamp;
pub mod stroke;
pub mod tune;

pub use color::parse_hex_color;
pub use engine::{
    default_output_path, is_supported_image, ProcessOptions, ProcessResult, RemovalEngine,
};
pub use error::{Error, Result};
pub use export::{flatten_onto_white, load_source, save_flattened, save_image};
pub use mask::{remove_background, LineExtraction, RemovalParams};
pub use noise::{NoiseReducer, NoiseReduction};
pub use session::{RemovalSession, StampSession};
pub use shape::BorderShape;
pub use stamp::{compose_stamp, render_guides, CarvingMode, GridGuide, StampConfig};
pub use stroke::{render_signature, CapStyle, PenSettings, StrokeRecorder, StrokeSegment};
pub use tune::AutoTune;
