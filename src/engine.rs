//! File and directory batch processing for background removal.

use std::path::{Path, PathBuf};

use log::debug;

use crate::export;
use crate::mask::{remove_background, RemovalParams};
use crate::tune::AutoTune;

/// Options controlling how each file is processed.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Retune parameters per image instead of using the engine's as given.
    pub auto: Option<AutoTune>,
    /// Flatten the result onto white instead of keeping transparency.
    pub white_background: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Where the output was written, when it was.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Fraction of pixels left visible (alpha > 0) in the result.
    pub coverage: f32,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            coverage: 0.0,
            message,
        }
    }
}

/// Background removal over files on disk.
///
/// Holds the base parameters; with [`ProcessOptions::auto`] each image is
/// tuned from them independently.
#[derive(Debug, Clone, Default)]
pub struct RemovalEngine {
    params: RemovalParams,
}

impl RemovalEngine {
    /// Create an engine with the given base parameters.
    #[must_use]
    pub fn new(params: RemovalParams) -> Self {
        Self { params }
    }

    /// Base parameters.
    #[must_use]
    pub fn params(&self) -> &RemovalParams {
        &self.params
    }

    /// Process a single image file: load, remove background, save.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let source = match export::load_source(input) {
            Ok(img) => img,
            Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
        };

        let params = match opts.auto {
            Some(strategy) => strategy.tune(&source, &self.params),
            None => self.params.clone(),
        };
        debug!("{}: {params:?}", input.display());
        let result = remove_background(&source, &params);

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return ProcessResult::failed(
                        input,
                        format!("Failed to create output directory: {e}"),
                    );
                }
            }
        }

        let saved = if opts.white_background {
            export::save_flattened(&result, output)
        } else {
            export::save_image(&result, output)
        };
        if let Err(e) = saved {
            return ProcessResult::failed(input, format!("Failed to save: {e}"));
        }

        let total = (result.width() as usize * result.height() as usize).max(1);
        let visible = result.pixels().filter(|p| p[3] > 0).count();
        #[allow(clippy::cast_precision_loss)]
        let coverage = visible as f32 / total as f32;
        ProcessResult {
            path: input.to_path_buf(),
            output: Some(output.to_path_buf()),
            success: true,
            coverage,
            message: "Background removed".to_string(),
        }
    }

    /// Process all supported images in a directory.
    ///
    /// Output files are named with [`default_output_path`] inside
    /// `output_dir`. Uses parallel iteration when the `cli` feature is
    /// enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };
        inputs.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let run = |input: &PathBuf| {
            let target = output_in(output_dir, input, opts.white_background);
            self.process_file(input, &target, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            inputs.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            inputs.iter().map(run).collect()
        }
    }
}

fn output_in(dir: &Path, input: &Path, white_background: bool) -> PathBuf {
    let name = default_output_path(input, white_background);
    match name.file_name() {
        Some(file) => dir.join(file),
        None => dir.join(name),
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp"
        ),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// `"scan.jpg"` becomes `"scan_nobg.png"`, or `"scan_nobg.jpg"` when the
/// result is flattened onto white.
#[must_use]
pub fn default_output_path(input: &Path, white_background: bool) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    let ext = if white_background { "jpg" } else { "png" };
    parent.join(format!("{stem}_nobg.{ext}"))
}
