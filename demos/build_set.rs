//! Build a sticker set from a directory of source images.
//!
//! Usage:
//! ```sh
//! cargo run --example build_set -- sources/ out/
//! ```

use std::env;
use std::process;

use sticker_grid::{PipelineConfig, ProcessOptions, StickerEngine};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input-dir> <output-dir>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let engine = StickerEngine::new(PipelineConfig::default());
    let opts = ProcessOptions::default();
    let result = engine.process_directory(input.as_ref(), output.as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
