//! Configuration consumed by the pipeline.

use std::time::Duration;

use crate::background::{clamp_threshold, DEFAULT_THRESHOLD, MIN_TUNABLE_THRESHOLD};
use crate::grid::GridLayout;
use crate::schedule::StickerCount;

/// Size of the sticker set's "main" image.
pub const MAIN_IMAGE_SIZE: (u32, u32) = (240, 240);
/// Size of the sticker set's "tab" image.
pub const TAB_IMAGE_SIZE: (u32, u32) = (96, 74);

/// Cool-down between grids when grids come from a generative service.
pub const GENERATION_COOL_DOWN: Duration = Duration::from_secs(5);

/// Options controlling the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Cell size; the grid is `2·cell_width × 4·cell_height`.
    pub layout: GridLayout,
    /// Background brightness threshold, `200..=255`. Lower removes more.
    pub threshold: u8,
    /// Requested sticker count; `None` uses every supplied source.
    pub sticker_count: Option<StickerCount>,
    /// Pause between consecutive grids.
    pub cool_down: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: GridLayout::default(),
            threshold: DEFAULT_THRESHOLD,
            sticker_count: None,
            cool_down: Duration::ZERO,
        }
    }
}

impl PipelineConfig {
    /// Set the cell size.
    #[must_use]
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the threshold, clamped into the tunable `200..=255` range.
    #[must_use]
    pub fn with_threshold(mut self, threshold: i32) -> Self {
        let clamped = clamp_threshold(threshold).max(MIN_TUNABLE_THRESHOLD);
        if i32::from(clamped) != threshold {
            log::warn!("threshold {threshold} out of range, using {clamped}");
        }
        self.threshold = clamped;
        self
    }

    /// Set the requested sticker count.
    #[must_use]
    pub fn with_sticker_count(mut self, count: Option<StickerCount>) -> Self {
        self.sticker_count = count;
        self
    }

    /// Set the pause between grids.
    #[must_use]
    pub fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    /// Number of stickers to produce from `available` sources.
    #[must_use]
    pub fn stickers_for(&self, available: usize) -> usize {
        match self.sticker_count {
            Some(count) if count.get() > available => {
                log::warn!(
                    "{} stickers requested but only {available} sources available",
                    count.get()
                );
                available
            }
            Some(count) => count.get(),
            None => available,
        }
    }
}
