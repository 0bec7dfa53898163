//! Sticker-set sizing and sequential grid scheduling.
//!
//! A sticker set of `n` stickers needs `ceil(n / 8)` grids. Every grid but
//! the last is full; the last holds `n - 8·(grids - 1)` real cells and the
//! rest are padding. Grids are processed strictly one after another, with a
//! cool-down between them so an upstream generator is not hammered.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::grid::CELLS_PER_GRID;

/// Supported sticker set sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StickerCount {
    /// 8 stickers, one grid.
    Eight,
    /// 16 stickers, two grids.
    Sixteen,
    /// 24 stickers, three grids.
    TwentyFour,
    /// 32 stickers, four grids.
    ThirtyTwo,
    /// 40 stickers, five grids.
    Forty,
}

impl StickerCount {
    /// Every supported size, smallest first.
    pub const ALL: [StickerCount; 5] = [
        StickerCount::Eight,
        StickerCount::Sixteen,
        StickerCount::TwentyFour,
        StickerCount::ThirtyTwo,
        StickerCount::Forty,
    ];

    /// Number of stickers.
    #[must_use]
    pub fn get(self) -> usize {
        match self {
            StickerCount::Eight => 8,
            StickerCount::Sixteen => 16,
            StickerCount::TwentyFour => 24,
            StickerCount::ThirtyTwo => 32,
            StickerCount::Forty => 40,
        }
    }
}

impl TryFrom<u32> for StickerCount {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.get() == value as usize)
            .ok_or(Error::InvalidStickerCount(value))
    }
}

/// Number of grids needed for `stickers` stickers.
#[must_use]
pub fn grid_count(stickers: usize) -> usize {
    stickers.div_ceil(CELLS_PER_GRID)
}

/// One grid of a sticker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    /// Zero-based grid index.
    pub index: usize,
    /// Index of this grid's first sticker within the whole set.
    pub first_sticker: usize,
    /// Number of real (non-padding) cells, `1..=8`.
    pub real_cells: usize,
}

/// Sequential plan for processing a sticker set grid by grid.
#[derive(Debug, Clone)]
pub struct GridSchedule {
    stickers: usize,
    cool_down: Duration,
}

impl GridSchedule {
    /// Plan `stickers` stickers with `cool_down` slept between grids.
    #[must_use]
    pub fn new(stickers: usize, cool_down: Duration) -> Self {
        Self {
            stickers,
            cool_down,
        }
    }

    /// Total stickers in the set.
    #[must_use]
    pub fn stickers(&self) -> usize {
        self.stickers
    }

    /// Number of grids in the plan.
    #[must_use]
    pub fn grid_count(&self) -> usize {
        grid_count(self.stickers)
    }

    /// The grids in processing order.
    #[must_use]
    pub fn slots(&self) -> Vec<GridSlot> {
        (0..self.grid_count())
            .map(|index| {
                let first_sticker = index * CELLS_PER_GRID;
                GridSlot {
                    index,
                    first_sticker,
                    real_cells: (self.stickers - first_sticker).min(CELLS_PER_GRID),
                }
            })
            .collect()
    }

    /// Run `f` on every grid in order, sleeping the cool-down between grids.
    ///
    /// Stops at the first error; the grid that failed is the only unit of
    /// work lost, results of earlier grids are discarded with it.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn run<T, F>(&self, mut f: F) -> Result<Vec<T>>
    where
        F: FnMut(GridSlot) -> Result<T>,
    {
        let slots = self.slots();
        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            if slot.index > 0 && !self.cool_down.is_zero() {
                log::debug!("cooling down for {:?} before grid {}", self.cool_down, slot.index + 1);
                std::thread::sleep(self.cool_down);
            }
            log::info!(
                "grid {}/{}: {} sticker(s)",
                slot.index + 1,
                self.grid_count(),
                slot.real_cells
            );
            results.push(f(slot)?);
        }
        Ok(results)
    }
}
