//! Composite, clean and split 2×4 sticker grids.
//!
//! Generated sticker artwork is laid out on a fixed grid of 2 columns by 4
//! rows (370×320 cells by default, the LINE sticker size). This crate builds
//! such grids, strips their near-white background with a border-connected
//! flood fill, erases divider seams the generator left behind, and crops the
//! result back into individual transparent stickers.
//!
//! # Quick Start
//!
//! ```no_run
//! use sticker_grid::{PipelineConfig, StickerEngine};
//!
//! let engine = StickerEngine::new(PipelineConfig::default());
//! let sources: Vec<_> = ["a.png", "b.png"]
//!     .iter()
//!     .map(|p| image::open(p).unwrap().to_rgba8())
//!     .collect();
//! let set = engine.build_set(&sources).expect("failed to build set");
//! for (i, sticker) in set.stickers.iter().enumerate() {
//!     sticker.save(format!("{:02}.png", i + 1)).unwrap();
//! }
//! ```
//!
//! # Individual stages
//!
//! Each stage borrows a bitmap and returns a new one, so they compose freely.
//!
//! ```no_run
//! use sticker_grid::{background, grid, GridLayout};
//!
//! let layout = GridLayout::default();
//! let sheet = image::open("grid.png").unwrap().to_rgba8();
//! let cleared = background::remove_background(&sheet, 240, None).unwrap();
//! let cells = grid::split(&cleared, layout);
//! assert_eq!(cells.len(), 8);
//! ```

#![deny(missing_docs)]

pub mod background;
pub mod codec;
pub mod config;
mod engine;
pub mod error;
pub mod grid;
pub mod schedule;
pub mod seams;

pub use background::{Mask, MaskValue};
pub use config::PipelineConfig;
pub use engine::{
    default_output_path, sticker_file_name, ProcessOptions, ProcessResult, StickerEngine,
    StickerSet,
};
pub use error::{Error, Result};
pub use grid::{CellPosition, GridLayout};
pub use schedule::{GridSchedule, GridSlot, StickerCount};
