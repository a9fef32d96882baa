//! Stateful front ends over the pure pipelines.
//!
//! A session owns what an interactive tool keeps between user actions: the
//! loaded photo and its latest result, or the recorded strokes and the latest
//! stamp preview. Every action is a method returning [`Result`]; a failed
//! precondition leaves the session untouched.

use std::path::Path;

use image::{RgbImage, RgbaImage};
use log::debug;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::error::{Error, Result};
use crate::export;
use crate::mask::{remove_background, RemovalParams};
use crate::stamp::{compose_stamp, StampConfig};
use crate::stroke::{render_signature, PenSettings, StrokeRecorder, StrokeSegment};
use crate::tune::AutoTune;

/// Background removal for one photo at a time.
#[derive(Debug, Clone, Default)]
pub struct RemovalSession {
    source: Option<RgbImage>,
    /// Parameters used by the next [`process`](Self::process).
    pub params: RemovalParams,
    result: Option<RgbaImage>,
}

impl RemovalSession {
    /// Create an empty session with the given parameters.
    #[must_use]
    pub fn new(params: RemovalParams) -> Self {
        Self {
            source: None,
            params,
            result: None,
        }
    }

    /// Load a photo from disk, replacing the source and dropping any result.
    ///
    /// # Errors
    ///
    /// Propagates [`export::load_source`] failures; the session is unchanged
    /// on error.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let img = export::load_source(path)?;
        debug!("loaded {}x{} source from {}", img.width(), img.height(), path.display());
        self.set_source(img);
        Ok(())
    }

    /// Use an in-memory photo as the source.
    pub fn set_source(&mut self, img: RgbImage) {
        self.source = Some(img);
        self.result = None;
    }

    /// The loaded photo, if any.
    #[must_use]
    pub fn source(&self) -> Option<&RgbImage> {
        self.source.as_ref()
    }

    /// The latest processed image, if any.
    #[must_use]
    pub fn result(&self) -> Option<&RgbaImage> {
        self.result.as_ref()
    }

    /// Run background removal with the current parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageLoaded`] without a source.
    pub fn process(&mut self) -> Result<&RgbaImage> {
        let source = self.source.as_ref().ok_or(Error::NoImageLoaded)?;
        let result = remove_background(source, &self.params);
        Ok(&*self.result.insert(result))
    }

    /// Discard the processed result and show the source again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageLoaded`] without a source.
    pub fn reset(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(Error::NoImageLoaded);
        }
        self.result = None;
        Ok(())
    }

    /// Tune the parameters for the loaded photo, then process it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageLoaded`] without a source.
    pub fn auto_optimize(&mut self, strategy: AutoTune) -> Result<&RgbaImage> {
        let source = self.source.as_ref().ok_or(Error::NoImageLoaded)?;
        self.params = strategy.tune(source, &self.params);
        self.process()
    }

    /// Save the result, keeping transparency where the format allows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToSave`] before [`process`](Self::process), or
    /// an export error.
    pub fn save(&self, path: &Path) -> Result<()> {
        let result = self.result.as_ref().ok_or(Error::NothingToSave)?;
        export::save_image(result, path)
    }

    /// Save the result flattened onto white.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub fn save_white_background(&self, path: &Path) -> Result<()> {
        let result = self.result.as_ref().ok_or(Error::NothingToSave)?;
        export::save_flattened(result, path)
    }
}

/// Freehand stamp and signature drawing.
#[derive(Debug)]
pub struct StampSession<R = ThreadRng> {
    recorder: StrokeRecorder<R>,
    /// Shape, colour and carving of the composed stamp.
    pub config: StampConfig,
    current: Option<RgbaImage>,
}

impl Default for StampSession<ThreadRng> {
    fn default() -> Self {
        Self::new(StampConfig::default())
    }
}

impl StampSession<ThreadRng> {
    /// Create a session with a default pen.
    #[must_use]
    pub fn new(config: StampConfig) -> Self {
        Self::with_recorder(StrokeRecorder::default(), config)
    }
}

impl<R: Rng> StampSession<R> {
    /// Create a session around an existing recorder.
    pub fn with_recorder(recorder: StrokeRecorder<R>, config: StampConfig) -> Self {
        Self {
            recorder,
            config,
            current: None,
        }
    }

    /// Current pen.
    #[must_use]
    pub fn pen(&self) -> &PenSettings {
        self.recorder.pen()
    }

    /// Change the pen for subsequent strokes.
    pub fn set_pen(&mut self, pen: PenSettings) {
        self.recorder.set_pen(pen);
    }

    /// Pointer pressed.
    pub fn press(&mut self, x: f32, y: f32) {
        self.recorder.press(x, y);
    }

    /// Pointer dragged; returns the recorded segment.
    pub fn drag(&mut self, x: f32, y: f32) -> Option<StrokeSegment> {
        self.recorder.drag(x, y)
    }

    /// Pointer released.
    pub fn release(&mut self) {
        self.recorder.release();
    }

    /// Clear the canvas: drop all strokes and the preview.
    pub fn clear(&mut self) {
        self.recorder.clear();
        self.current = None;
    }

    /// Recorded strokes.
    #[must_use]
    pub fn strokes(&self) -> &[StrokeSegment] {
        self.recorder.segments()
    }

    /// The latest preview, if any.
    #[must_use]
    pub fn current(&self) -> Option<&RgbaImage> {
        self.current.as_ref()
    }

    /// Compose the stamp from the strokes so far and keep it as the preview.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToCompose`] without strokes; the previous
    /// preview is kept.
    pub fn generate_preview(&mut self) -> Result<&RgbaImage> {
        let stamp = compose_stamp(self.recorder.segments(), &self.config)?;
        Ok(&*self.current.insert(stamp))
    }

    /// Save the preview, keeping transparency where the format allows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToSave`] before a preview exists.
    pub fn save(&self, path: &Path) -> Result<()> {
        let stamp = self.current.as_ref().ok_or(Error::NothingToSave)?;
        export::save_image(stamp, path)
    }

    /// Render the strokes as a signature in their own pen colours.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToCompose`] without strokes.
    pub fn signature_image(&self, width: u32, height: u32) -> Result<RgbaImage> {
        render_signature(self.recorder.segments(), width, height)
    }
}
