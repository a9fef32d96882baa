use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sigstamp::{
    default_output_path, render_guides, save_flattened, save_image, AutoTune, BorderShape,
    GridGuide, NoiseReduction, ProcessOptions, ProcessResult, RemovalEngine, RemovalParams,
    StampConfig,
};

#[derive(Parser)]
#[command(
    name = "sigstamp",
    about = "Make transparent signature and stamp images",
    version,
    after_help = "Simple usage: sigstamp remove <image>  (writes {name}_nobg.png next to it)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove the white background from a photo or every photo in a directory
    Remove(RemoveArgs),
    /// Flatten a transparent image onto white
    Flatten {
        /// Input image with alpha
        input: PathBuf,
        /// Output file (JPEG, PNG, BMP, ...)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the stamp drawing guides as a transparent PNG template
    Guides(GuideArgs),
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
struct RemoveArgs {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_nobg.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Classification mode
    #[arg(long, value_enum, default_value_t = Mode::Lines)]
    mode: Mode,

    /// White threshold: pixels with every channel at or above it are removed
    #[arg(long, default_value_t = 200)]
    threshold: u8,

    /// Contrast factor applied before masking
    #[arg(long, default_value_t = 1.5)]
    contrast: f32,

    /// Brightness factor applied before contrast
    #[arg(long, default_value_t = 1.0)]
    brightness: f32,

    /// Keep bright gray scanner shadows
    #[arg(long)]
    no_shadow_removal: bool,

    /// Brightness above which gray pixels count as shadow
    #[arg(long, default_value_t = 150)]
    shadow_threshold: u8,

    /// Alpha blur radius (0-5)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=5))]
    blur: u32,

    /// Alpha edge smoothing passes (0-5)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(0..=5))]
    smooth: u32,

    /// Speckle cleanup in line mode
    #[arg(long, value_enum, default_value_t = Noise::Morphology)]
    noise: Noise,

    /// Tune parameters per image from its statistics
    #[arg(long, value_enum)]
    auto: Option<Auto>,

    /// Flatten the result onto white (default output becomes {name}_nobg.jpg)
    #[arg(short, long)]
    white_background: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
struct GuideArgs {
    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// Canvas size in pixels
    #[arg(long, default_value_t = 300)]
    size: u32,

    /// Border shape
    #[arg(long, value_enum, default_value_t = Border::Rectangle)]
    border: Border,

    /// Border thickness (1-20)
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=20))]
    thickness: u32,

    /// Grid: none, RxC (e.g. 2x2), or korean-cross
    #[arg(long, default_value = "korean-cross")]
    grid: GridGuide,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Remove white paper and gray shadows
    Standard,
    /// Keep only dark ink lines
    Lines,
}

#[derive(Clone, Copy, ValueEnum)]
enum Auto {
    General,
    Lines,
}

#[derive(Clone, Copy, ValueEnum)]
enum Noise {
    Morphology,
    Majority,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum Border {
    Rectangle,
    Circle,
    Ellipse,
    Elongated,
    Rounded,
    None,
}

impl From<Auto> for AutoTune {
    fn from(a: Auto) -> Self {
        match a {
            Auto::General => Self::General,
            Auto::Lines => Self::LineExtraction,
        }
    }
}

impl From<Noise> for NoiseReduction {
    fn from(n: Noise) -> Self {
        match n {
            Noise::Morphology => Self::Morphology,
            Noise::Majority => Self::MajorityVote,
            Noise::Off => Self::Off,
        }
    }
}

impl From<Border> for BorderShape {
    fn from(b: Border) -> Self {
        match b {
            Border::Rectangle => Self::Rectangle,
            Border::Circle => Self::Circle,
            Border::Ellipse => Self::Ellipse,
            Border::Elongated => Self::ElongatedEllipse,
            Border::Rounded => Self::RoundedRectangle,
            Border::None => Self::None,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Remove(args) => remove(&args),
        Command::Flatten { input, output } => {
            init_logging(false);
            flatten(&input, &output);
        }
        Command::Guides(args) => {
            init_logging(false);
            guides(&args);
        }
    }
}

fn remove(args: &RemoveArgs) {
    init_logging(args.verbose);

    let params = RemovalParams {
        threshold: args.threshold,
        contrast: args.contrast,
        brightness: args.brightness,
        shadow_removal: !args.no_shadow_removal,
        shadow_threshold: args.shadow_threshold,
        line_only: matches!(args.mode, Mode::Lines),
        blur_radius: args.blur,
        edge_smooth_passes: args.smooth,
        noise: args.noise.into(),
        ..RemovalParams::default()
    };
    let opts = ProcessOptions {
        auto: args.auto.map(AutoTune::from),
        white_background: args.white_background,
        verbose: args.verbose,
        quiet: args.quiet,
    };
    let engine = RemovalEngine::new(params);

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        process::exit(1);
    }

    if !opts.quiet {
        match opts.auto {
            Some(strategy) => eprintln!("Auto-tuning enabled ({strategy:?})"),
            None => eprintln!(
                "Mode: {}",
                if engine.params().line_only {
                    "ink lines"
                } else {
                    "standard"
                }
            ),
        }
        eprintln!();
    }

    let results = if args.input.is_dir() {
        let Some(output_dir) = &args.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: sigstamp remove <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(&args.input, output_dir, &opts)
    } else {
        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.input, opts.white_background));
        vec![engine.process_file(&args.input, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        let target = result
            .output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "[OK] {filename} -> {target} ({:.0}% kept)",
            result.coverage * 100.0
        );
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}

fn flatten(input: &Path, output: &Path) {
    let img = match image::open(input) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("[FAIL] {}: Failed to load: {e}", input.display());
            process::exit(1);
        }
    };
    if let Err(e) = save_flattened(&img, output) {
        eprintln!("[FAIL] {}: Failed to save: {e}", input.display());
        process::exit(1);
    }
    eprintln!("[OK] {} -> {}", input.display(), output.display());
}

fn guides(args: &GuideArgs) {
    let config = StampConfig {
        size: args.size,
        border: args.border.into(),
        border_thickness: args.thickness,
        grid: args.grid,
        ..StampConfig::default()
    };
    let overlay = render_guides(&config);

    if let Err(e) = save_image(&overlay, &args.output) {
        eprintln!("[FAIL] {}: {e}", args.output.display());
        process::exit(1);
    }
    eprintln!(
        "[OK] {} ({}x{}, grid {})",
        args.output.display(),
        config.size,
        config.size,
        config.grid
    );
}
