//! Grid geometry, the grid compositor and the grid splitter.
//!
//! A grid is a fixed 2-column by 4-row canvas. Cell `i` sits at
//! `row = i / 2`, `col = i % 2`, and every cell has the same size, so a
//! cell's pixel rectangle is fully determined by its position and the
//! [`GridLayout`].

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::codec;
use crate::error::{Error, Result};
use crate::seams;

/// Number of cell columns in a grid.
pub const GRID_COLUMNS: u32 = 2;
/// Number of cell rows in a grid.
pub const GRID_ROWS: u32 = 4;
/// Number of cells (sticker slots) in a grid.
pub const CELLS_PER_GRID: usize = 8;

/// Default cell width required for LINE stickers.
pub const DEFAULT_CELL_WIDTH: u32 = 370;
/// Default cell height required for LINE stickers.
pub const DEFAULT_CELL_HEIGHT: u32 = 320;

/// Filter used whenever a bitmap is rescaled.
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Cell dimensions of a grid. The canvas is always `2·cell_width × 4·cell_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Width of a single cell in pixels.
    pub cell_width: u32,
    /// Height of a single cell in pixels.
    pub cell_height: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_width: DEFAULT_CELL_WIDTH,
            cell_height: DEFAULT_CELL_HEIGHT,
        }
    }
}

impl GridLayout {
    /// Create a layout; zero dimensions are raised to one pixel.
    #[must_use]
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
        }
    }

    /// Width of the full grid canvas.
    #[must_use]
    pub fn grid_width(&self) -> u32 {
        GRID_COLUMNS * self.cell_width
    }

    /// Height of the full grid canvas.
    #[must_use]
    pub fn grid_height(&self) -> u32 {
        GRID_ROWS * self.cell_height
    }

    /// Pixel rectangle `(x, y, width, height)` of a cell.
    #[must_use]
    pub fn cell_rect(&self, pos: CellPosition) -> (u32, u32, u32, u32) {
        (
            pos.col * self.cell_width,
            pos.row * self.cell_height,
            self.cell_width,
            self.cell_height,
        )
    }

    /// X coordinates of the internal vertical cell boundaries.
    #[must_use]
    pub fn vertical_seams(&self) -> Vec<u32> {
        (1..GRID_COLUMNS).map(|c| c * self.cell_width).collect()
    }

    /// Y coordinates of the internal horizontal cell boundaries.
    #[must_use]
    pub fn horizontal_seams(&self) -> Vec<u32> {
        (1..GRID_ROWS).map(|r| r * self.cell_height).collect()
    }

    /// Stretch `img` to the exact grid size, or copy it if it already fits.
    #[must_use]
    pub fn resample_to_grid(&self, img: &RgbaImage) -> RgbaImage {
        let (w, h) = (self.grid_width(), self.grid_height());
        if img.dimensions() == (w, h) {
            img.clone()
        } else {
            log::debug!(
                "resampling {}x{} grid to {w}x{h}",
                img.width(),
                img.height()
            );
            imageops::resize(img, w, h, RESAMPLE_FILTER)
        }
    }
}

/// A cell's `(row, col)` position inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    /// Row, `0..4`.
    pub row: u32,
    /// Column, `0..2`.
    pub col: u32,
}

impl CellPosition {
    /// Position of the cell with row-major index `index`, or `None` when
    /// `index` is not in `0..8`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELLS_PER_GRID {
            return None;
        }
        let index = index as u32;
        Some(Self {
            row: index / GRID_COLUMNS,
            col: index % GRID_COLUMNS,
        })
    }

    /// All eight positions in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..GRID_ROWS).flat_map(|row| (0..GRID_COLUMNS).map(move |col| Self { row, col }))
    }

    /// Row-major index of this position.
    #[must_use]
    pub fn index(&self) -> usize {
        (self.row * GRID_COLUMNS + self.col) as usize
    }
}

/// Largest `(width, height)` with the aspect ratio of `w × h` that fits in
/// `max_w × max_h`. Never returns a zero dimension.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (max_w.max(1), max_h.max(1));
    }
    let scale = f64::min(
        f64::from(max_w) / f64::from(w),
        f64::from(max_h) / f64::from(h),
    );
    let fw = (f64::from(w) * scale).round() as u32;
    let fh = (f64::from(h) * scale).round() as u32;
    (fw.clamp(1, max_w.max(1)), fh.clamp(1, max_h.max(1)))
}

/// Scale `src` to fit inside `rect` and composite it centered onto `canvas`.
fn place_centered(canvas: &mut RgbaImage, src: &RgbaImage, rect: (u32, u32, u32, u32)) {
    let (x, y, w, h) = rect;
    let (fw, fh) = fit_within(src.width(), src.height(), w, h);
    let scaled = if src.dimensions() == (fw, fh) {
        src.clone()
    } else {
        imageops::resize(src, fw, fh, RESAMPLE_FILTER)
    };
    let ox = x + (w - fw) / 2;
    let oy = y + (h - fh) / 2;
    imageops::overlay(canvas, &scaled, i64::from(ox), i64::from(oy));
}

/// Fit `src` (aspect preserved) centered onto a new `width × height` canvas
/// filled with `background`.
#[must_use]
pub fn fit_onto_canvas(
    src: &RgbaImage,
    width: u32,
    height: u32,
    background: Rgba<u8>,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, background);
    place_centered(&mut canvas, src, (0, 0, width, height));
    canvas
}

fn composite_slots<'a, I>(slots: I, layout: GridLayout) -> RgbaImage
where
    I: IntoIterator<Item = Option<&'a RgbaImage>>,
{
    let mut canvas = RgbaImage::from_pixel(layout.grid_width(), layout.grid_height(), WHITE);
    for (pos, slot) in CellPosition::all().zip(slots) {
        if let Some(src) = slot {
            place_centered(&mut canvas, src, layout.cell_rect(pos));
        }
    }
    canvas
}

/// Arrange up to eight images into a white `2·cw × 4·ch` grid canvas.
///
/// Each image is scaled to fit its cell (aspect preserved) and centered.
/// Cells without an image stay white. Images beyond the eighth are ignored.
///
/// # Errors
///
/// Returns [`Error::EmptyInput`] if `images` is empty.
pub fn composite(images: &[RgbaImage], layout: GridLayout) -> Result<RgbaImage> {
    if images.is_empty() {
        return Err(Error::EmptyInput);
    }
    if images.len() > CELLS_PER_GRID {
        log::warn!(
            "{} images supplied, only the first {CELLS_PER_GRID} fit in a grid",
            images.len()
        );
    }
    log::debug!("compositing {} images into a grid", images.len().min(CELLS_PER_GRID));
    Ok(composite_slots(images.iter().map(Some), layout))
}

/// Like [`composite`], but from encoded buffers.
///
/// A buffer that fails to decode still occupies its cell, which is left
/// white; the rest of the grid is built normally.
///
/// # Errors
///
/// Returns [`Error::EmptyInput`] if `buffers` is empty.
pub fn composite_encoded<B: AsRef<[u8]>>(buffers: &[B], layout: GridLayout) -> Result<RgbaImage> {
    if buffers.is_empty() {
        return Err(Error::EmptyInput);
    }
    let decoded: Vec<Option<RgbaImage>> = buffers
        .iter()
        .take(CELLS_PER_GRID)
        .enumerate()
        .map(|(index, buf)| match codec::decode(buf.as_ref()) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("cell {index}: leaving blank, {e}");
                None
            }
        })
        .collect();
    Ok(composite_slots(decoded.iter().map(Option::as_ref), layout))
}

/// Crop a grid into its eight cells in row-major order.
///
/// Seams are erased first, which also stretches the grid to the exact
/// `2·cw × 4·ch` size. All eight cells are returned; padding cells of a
/// partial final grid are for the caller to drop.
#[must_use]
pub fn split(grid: &RgbaImage, layout: GridLayout) -> Vec<RgbaImage> {
    let cleaned = seams::erase_seams(grid, layout);
    CellPosition::all()
        .map(|pos| {
            let (x, y, w, h) = layout.cell_rect(pos);
            imageops::crop_imm(&cleaned, x, y, w, h).to_image()
        })
        .collect()
}

/// Decode a grid image and [`split`] it.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the buffer is not a valid image.
pub fn split_encoded(bytes: &[u8], layout: GridLayout) -> Result<Vec<RgbaImage>> {
    let grid = codec::decode(bytes)?;
    Ok(split(&grid, layout))
}
