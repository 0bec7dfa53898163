//! Sticker pipeline engine: grids in, finished stickers out.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::background::{self, Mask};
use crate::codec;
use crate::config::{PipelineConfig, MAIN_IMAGE_SIZE, TAB_IMAGE_SIZE};
use crate::error::{Error, Result};
use crate::grid::{self, CELLS_PER_GRID};
use crate::schedule::{GridSchedule, GridSlot};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Options controlling file-level processing.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Also write each composited grid as `grid_NN.png`.
    pub keep_grids: bool,
    /// Split a grid without removing its background first.
    pub keep_background: bool,
    /// Number of real cells when splitting a single grid (default 8).
    pub real_cells: Option<usize>,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of one file-level operation.
#[derive(Debug)]
pub struct ProcessResult {
    /// Input file or directory.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether there was nothing to do (e.g. a split asked for no cells).
    pub skipped: bool,
    /// Number of sticker images written.
    pub stickers: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            stickers: 0,
            message,
        }
    }
}

/// A finished sticker set.
#[derive(Debug, Clone, Default)]
pub struct StickerSet {
    /// The composited grids, before background removal.
    pub grids: Vec<RgbaImage>,
    /// The cleaned stickers, in set order. Padding cells are not included.
    pub stickers: Vec<RgbaImage>,
    /// The 240×240 "main" image.
    pub main: Option<RgbaImage>,
    /// The 96×74 "tab" image.
    pub tab: Option<RgbaImage>,
}

impl StickerSet {
    /// Encode every image as PNG, named the way a sticker archive expects.
    ///
    /// Stickers become `01.png`, `02.png`, …; then `main.png` and `tab.png`.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn encode_entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        self.named_images()
            .into_iter()
            .map(|(name, img)| Ok((name, codec::encode_png(img)?)))
            .collect()
    }

    fn named_images(&self) -> Vec<(String, &RgbaImage)> {
        let mut named: Vec<_> = self
            .stickers
            .iter()
            .enumerate()
            .map(|(i, img)| (sticker_file_name(i), img))
            .collect();
        if let Some(main) = &self.main {
            named.push(("main.png".to_string(), main));
        }
        if let Some(tab) = &self.tab {
            named.push(("tab.png".to_string(), tab));
        }
        named
    }
}

/// File name of the `index`-th sticker (zero-based): `01.png`, `02.png`, …
#[must_use]
pub fn sticker_file_name(index: usize) -> String {
    format!("{:02}.png", index + 1)
}

/// The sticker engine holding the pipeline configuration.
///
/// Create once with [`StickerEngine::new()`] and reuse for many sets. Every
/// operation takes borrowed bitmaps and returns fresh ones.
#[derive(Debug, Clone, Default)]
pub struct StickerEngine {
    config: PipelineConfig,
}

impl StickerEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Remove the background of a single image with the configured threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaskSize`] if `mask` does not match `img`.
    pub fn remove_background(&self, img: &RgbaImage, mask: Option<&Mask>) -> Result<RgbaImage> {
        background::remove_background(img, i32::from(self.config.threshold), mask)
    }

    /// Remove the background of a grid, split it and keep the real cells.
    ///
    /// # Errors
    ///
    /// Propagates errors from background removal.
    pub fn clean_grid(&self, grid: &RgbaImage, real_cells: usize) -> Result<Vec<RgbaImage>> {
        let cleared = self.remove_background(grid, None)?;
        Ok(self.split_cells(&cleared, real_cells))
    }

    fn split_cells(&self, grid: &RgbaImage, real_cells: usize) -> Vec<RgbaImage> {
        let mut cells = grid::split(grid, self.config.layout);
        cells.truncate(real_cells.min(CELLS_PER_GRID));
        cells
    }

    /// Composite, clean and split one grid worth of sources.
    ///
    /// Returns the composited grid and its `real_cells` stickers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `sources` is empty.
    pub fn process_grid(
        &self,
        sources: &[RgbaImage],
        real_cells: usize,
    ) -> Result<(RgbaImage, Vec<RgbaImage>)> {
        let grid = grid::composite(sources, self.config.layout)?;
        let stickers = self.clean_grid(&grid, real_cells)?;
        Ok((grid, stickers))
    }

    /// Fit a background-removed copy of `src` onto a transparent canvas.
    fn auxiliary_image(&self, src: &RgbaImage, size: (u32, u32)) -> Result<RgbaImage> {
        let cleared = self.remove_background(src, None)?;
        Ok(grid::fit_onto_canvas(&cleared, size.0, size.1, TRANSPARENT))
    }

    /// The set's 240×240 "main" image.
    ///
    /// # Errors
    ///
    /// Propagates errors from background removal.
    pub fn main_image(&self, src: &RgbaImage) -> Result<RgbaImage> {
        self.auxiliary_image(src, MAIN_IMAGE_SIZE)
    }

    /// The set's 96×74 "tab" image.
    ///
    /// # Errors
    ///
    /// Propagates errors from background removal.
    pub fn tab_image(&self, src: &RgbaImage) -> Result<RgbaImage> {
        self.auxiliary_image(src, TAB_IMAGE_SIZE)
    }

    fn schedule(&self, available: usize) -> GridSchedule {
        GridSchedule::new(self.config.stickers_for(available), self.config.cool_down)
    }

    fn assemble<F>(&self, available: usize, mut make_grid: F) -> Result<StickerSet>
    where
        F: FnMut(GridSlot) -> Result<RgbaImage>,
    {
        let schedule = self.schedule(available);
        if schedule.stickers() == 0 {
            return Err(Error::EmptyInput);
        }
        let per_grid = schedule.run(|slot| {
            let grid = make_grid(slot)?;
            let stickers = self.clean_grid(&grid, slot.real_cells)?;
            Ok((grid, stickers))
        })?;

        let mut set = StickerSet::default();
        for (grid, stickers) in per_grid {
            set.grids.push(grid);
            set.stickers.extend(stickers);
        }
        Ok(set)
    }

    /// Build a whole sticker set from decoded sources.
    ///
    /// Sources are placed eight per grid in order; the main and tab images
    /// are made from the first source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if there are no sources.
    pub fn build_set(&self, sources: &[RgbaImage]) -> Result<StickerSet> {
        let mut set = self.assemble(sources.len(), |slot| {
            let end = slot.first_sticker + slot.real_cells;
            grid::composite(&sources[slot.first_sticker..end], self.config.layout)
        })?;
        if let Some(first) = sources.first() {
            set.main = Some(self.main_image(first)?);
            set.tab = Some(self.tab_image(first)?);
        }
        Ok(set)
    }

    /// Build a whole sticker set from encoded sources.
    ///
    /// Undecodable buffers leave their cell blank and still produce a
    /// (transparent) sticker. The main and tab images come from the first
    /// buffer that decodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if there are no buffers.
    pub fn build_set_encoded<B: AsRef<[u8]>>(&self, buffers: &[B]) -> Result<StickerSet> {
        let mut set = self.assemble(buffers.len(), |slot| {
            let end = slot.first_sticker + slot.real_cells;
            grid::composite_encoded(&buffers[slot.first_sticker..end], self.config.layout)
        })?;
        if let Some(first) = buffers.iter().find_map(|b| codec::decode(b.as_ref()).ok()) {
            set.main = Some(self.main_image(&first)?);
            set.tab = Some(self.tab_image(&first)?);
        }
        Ok(set)
    }

    /// Process a directory of source images into a sticker set on disk.
    ///
    /// Writes `01.png…NN.png`, `main.png`, `tab.png` (and `grid_NN.png` with
    /// [`ProcessOptions::keep_grids`]) into `output_dir`.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let sources = match codec::collect_sources(input_dir) {
            Ok(s) if s.is_empty() => {
                return ProcessResult::failed(input_dir, "No source images found".to_string());
            }
            Ok(s) => s,
            Err(e) => {
                return ProcessResult::failed(input_dir, format!("Failed to read directory: {e}"));
            }
        };

        let mut buffers = Vec::with_capacity(sources.len());
        for path in &sources {
            match std::fs::read(path) {
                Ok(bytes) => buffers.push(bytes),
                Err(e) => {
                    return ProcessResult::failed(
                        input_dir,
                        format!("Failed to read {}: {e}", path.display()),
                    );
                }
            }
        }
        log::info!("{} source image(s) in {}", buffers.len(), input_dir.display());

        let set = match self.build_set_encoded(&buffers) {
            Ok(set) => set,
            Err(e) => return ProcessResult::failed(input_dir, format!("Failed to build set: {e}")),
        };

        let mut outputs: Vec<(PathBuf, &RgbaImage)> = set
            .named_images()
            .into_iter()
            .map(|(name, img)| (output_dir.join(name), img))
            .collect();
        if opts.keep_grids {
            outputs.extend(
                set.grids
                    .iter()
                    .enumerate()
                    .map(|(i, g)| (output_dir.join(format!("grid_{:02}.png", i + 1)), g)),
            );
        }

        match write_outputs(output_dir, &outputs) {
            Ok(()) => ProcessResult {
                path: input_dir.to_path_buf(),
                success: true,
                skipped: false,
                stickers: set.stickers.len(),
                message: format!(
                    "{} sticker(s) from {} grid(s)",
                    set.stickers.len(),
                    set.grids.len()
                ),
            },
            Err(e) => ProcessResult::failed(input_dir, format!("Failed to save: {e}")),
        }
    }

    /// Split an already generated grid image into sticker files.
    #[must_use]
    pub fn split_file(
        &self,
        input: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let real_cells = opts.real_cells.unwrap_or(CELLS_PER_GRID);
        if real_cells == 0 {
            return ProcessResult {
                path: input.to_path_buf(),
                success: true,
                skipped: true,
                stickers: 0,
                message: "No cells requested".to_string(),
            };
        }
        let grid = match codec::load(input) {
            Ok(img) => img,
            Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
        };

        let cells = if opts.keep_background {
            Ok(self.split_cells(&grid, real_cells))
        } else {
            self.clean_grid(&grid, real_cells)
        };
        let cells = match cells {
            Ok(c) => c,
            Err(e) => return ProcessResult::failed(input, format!("Failed to split: {e}")),
        };

        let outputs: Vec<(PathBuf, &RgbaImage)> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (output_dir.join(sticker_file_name(i)), c))
            .collect();

        match write_outputs(output_dir, &outputs) {
            Ok(()) => ProcessResult {
                path: input.to_path_buf(),
                success: true,
                skipped: false,
                stickers: cells.len(),
                message: format!("{} sticker(s)", cells.len()),
            },
            Err(e) => ProcessResult::failed(input, format!("Failed to save: {e}")),
        }
    }

    /// Remove the background of one image file, optionally with a painted mask.
    #[must_use]
    pub fn remove_background_file(
        &self,
        input: &Path,
        output: &Path,
        mask: Option<&Path>,
    ) -> ProcessResult {
        let img = match codec::load(input) {
            Ok(img) => img,
            Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
        };
        let mask = match mask.map(codec::load).transpose() {
            Ok(m) => m.map(|overlay| Mask::from_image(&overlay)),
            Err(e) => return ProcessResult::failed(input, format!("Failed to load mask: {e}")),
        };

        let result = self
            .remove_background(&img, mask.as_ref())
            .and_then(|out| codec::save_png(&out, output));
        match result {
            Ok(()) => ProcessResult {
                path: input.to_path_buf(),
                success: true,
                skipped: false,
                stickers: 1,
                message: "Background removed".to_string(),
            },
            Err(e) => ProcessResult::failed(input, format!("Failed: {e}")),
        }
    }
}

/// Write PNG outputs into `output_dir`.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
fn write_outputs(output_dir: &Path, outputs: &[(PathBuf, &RgbaImage)]) -> Result<()> {
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)?;
    }

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        outputs
            .par_iter()
            .try_for_each(|(path, img)| codec::save_png(img, path))
    }

    #[cfg(not(feature = "cli"))]
    {
        outputs
            .iter()
            .try_for_each(|(path, img)| codec::save_png(img, path))
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"cat.jpg"` becomes `"cat_nobg.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_nobg.png"))
}
