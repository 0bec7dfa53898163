use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use sticker_grid::{
    default_output_path, GridLayout, PipelineConfig, ProcessOptions, ProcessResult,
    StickerCount, StickerEngine,
};

#[derive(Parser)]
#[command(
    name = "sticker-grid",
    about = "Composite, clean and split 2x4 sticker grids",
    version,
    after_help = "Stickers are written as 01.png, 02.png, ... plus main.png (240x240) \
                  and tab.png (96x74).\n\
                  Set RUST_LOG=debug for per-stage details."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build a sticker set from a directory of source images
    Build(BuildArgs),
    /// Split an already generated grid image into stickers
    Split(SplitArgs),
    /// Remove the background of a single image
    RemoveBg(RemoveBgArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Background brightness threshold (200-255, lower removes more)
    #[arg(short, long, default_value_t = 240)]
    threshold: i32,

    /// Cell width in pixels
    #[arg(long, default_value_t = 370)]
    cell_width: u32,

    /// Cell height in pixels
    #[arg(long, default_value_t = 320)]
    cell_height: u32,
}

#[derive(Args)]
struct BuildArgs {
    /// Directory of source images, placed in file name order
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Sticker count (8, 16, 24, 32 or 40); default uses every source
    #[arg(short, long)]
    count: Option<u32>,

    /// Pause between grids in milliseconds
    #[arg(long, default_value_t = 0)]
    cool_down_ms: u64,

    /// Also write the composited grids as grid_NN.png
    #[arg(long)]
    keep_grids: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct SplitArgs {
    /// Grid image to split
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Number of real stickers in this grid (1-8)
    #[arg(short = 'n', long, default_value_t = 8)]
    cells: usize,

    /// Do not remove the background before splitting
    #[arg(long)]
    keep_background: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct RemoveBgArgs {
    /// Input image
    input: PathBuf,

    /// Output PNG (default: {name}_nobg.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Painted mask image: green protects, red deletes
    #[arg(short, long)]
    mask: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl PipelineArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_layout(GridLayout::new(self.cell_width, self.cell_height))
            .with_threshold(self.threshold)
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn require_exists(path: &Path) {
    if !path.exists() {
        eprintln!("Error: Input path does not exist: {}", path.display());
        process::exit(1);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let opts = ProcessOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        ..ProcessOptions::default()
    };

    let result = match &cli.command {
        Command::Build(args) => {
            require_exists(&args.input);
            if !args.input.is_dir() {
                eprintln!("Error: build expects a directory of source images");
                process::exit(1);
            }
            let count = match args.count.map(StickerCount::try_from).transpose() {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
            let config = args
                .pipeline
                .config()
                .with_sticker_count(count)
                .with_cool_down(Duration::from_millis(args.cool_down_ms));
            let opts = ProcessOptions {
                keep_grids: args.keep_grids,
                ..opts.clone()
            };
            StickerEngine::new(config).process_directory(&args.input, &args.output, &opts)
        }
        Command::Split(args) => {
            require_exists(&args.input);
            if !(1..=8).contains(&args.cells) {
                eprintln!("Error: --cells must be between 1 and 8");
                process::exit(1);
            }
            let opts = ProcessOptions {
                keep_background: args.keep_background,
                real_cells: Some(args.cells),
                ..opts.clone()
            };
            StickerEngine::new(args.pipeline.config()).split_file(&args.input, &args.output, &opts)
        }
        Command::RemoveBg(args) => {
            require_exists(&args.input);
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(&args.input));
            StickerEngine::new(args.pipeline.config()).remove_background_file(
                &args.input,
                &output,
                args.mask.as_deref(),
            )
        }
    };

    print_result(&result, &opts);

    if !result.success {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let name = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        eprintln!("[SKIP] {name}: {}", result.message);
    } else if result.success {
        eprintln!("[OK] {name}: {}", result.message);
    } else {
        eprintln!("[FAIL] {name}: {}", result.message);
    }

    if opts.verbose && result.stickers > 0 {
        eprintln!("  -> {} image(s) written", result.stickers);
    }
}
