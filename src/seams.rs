//! Seam artifact removal at the internal grid boundaries.
//!
//! The upstream generator is asked not to draw cell dividers but often
//! leaves thin lines anyway. Their position is known exactly (one vertical
//! seam at `x = cw`, three horizontal seams at `y = ch, 2ch, 3ch`), so each
//! seam is cleaned inside a narrow band:
//!
//! - **Hard erase**: within ±3 px of the seam, on a light background, any
//!   pixel darker than 200 is painted with the background colour, alpha
//!   included, so a divider on a cleared field becomes transparent.
//! - **Smoothing**: elsewhere in the ±5 px band, a pixel whose brightness
//!   differs by more than 15 from either band edge is replaced by the
//!   inverse-distance blend of the two band edges.
//!
//! The background colour is estimated from the four corner pixels. Two
//! passes are run; the second catches residue the first pass's smoothing
//! left behind. The constants are empirically tuned and kept as-is.

use image::{Rgba, RgbaImage};

use crate::grid::GridLayout;

/// Number of passes over each seam.
const PASSES: usize = 2;
/// Half-width of the band inspected around each seam.
const BAND: i64 = 5;
/// Half-width of the band where dark pixels are erased outright.
const HARD_BAND: i64 = 3;
/// Mean corner brightness above which the background counts as light.
const LIGHT_BACKGROUND: f32 = 200.0;
/// Brightness below which a pixel near a seam on a light field is a line.
const DARK_LINE: u32 = 200;
/// Brightness jump that counts as a discontinuity.
const EDGE_DIFF: u32 = 15;

/// Orientation of a seam line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Constant `x`, runs top to bottom.
    Vertical,
    /// Constant `y`, runs left to right.
    Horizontal,
}

/// Sum of RGB; brightness comparisons scale their constants by 3 instead of dividing.
#[inline]
fn channel_sum(px: &Rgba<u8>) -> u32 {
    u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2])
}

/// Average RGBA of the four corners and whether its RGB reads as light.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimate_background(img: &RgbaImage) -> (Rgba<u8>, bool) {
    let (w, h) = img.dimensions();
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
    let mut sum = [0.0_f32; 4];
    for (x, y) in corners {
        let px = img.get_pixel(x, y);
        for (acc, &ch) in sum.iter_mut().zip(&px.0) {
            *acc += f32::from(ch);
        }
    }
    let avg = sum.map(|s| s / 4.0);
    let light = (avg[0] + avg[1] + avg[2]) / 3.0 > LIGHT_BACKGROUND;
    (Rgba(avg.map(|c| c.round().clamp(0.0, 255.0) as u8)), light)
}

/// Blend two colours with weights inversely proportional to their distances.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn inverse_distance_blend(a: &Rgba<u8>, dist_a: f32, b: &Rgba<u8>, dist_b: f32) -> [u8; 3] {
    let (wa, wb) = (1.0 / dist_a, 1.0 / dist_b);
    let mut out = [0u8; 3];
    for (ch, o) in out.iter_mut().enumerate() {
        let v = (f32::from(a[ch]) * wa + f32::from(b[ch]) * wb) / (wa + wb);
        *o = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Clean one seam, reading from `src` and writing into `out`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn clean_seam(
    src: &RgbaImage,
    out: &mut RgbaImage,
    axis: Axis,
    center: u32,
    background: Rgba<u8>,
    light: bool,
) {
    let (w, h) = src.dimensions();
    let (along_len, across_len) = match axis {
        Axis::Vertical => (h, w),
        Axis::Horizontal => (w, h),
    };
    let coord = |along: u32, across: i64| -> (u32, u32) {
        match axis {
            Axis::Vertical => (across as u32, along),
            Axis::Horizontal => (along, across as u32),
        }
    };

    let last = i64::from(across_len) - 1;
    let center = i64::from(center);
    let before = (center - BAND).clamp(0, last);
    let after = (center + BAND).clamp(0, last);

    for along in 0..along_len {
        let (bx, by) = coord(along, before);
        let (ax, ay) = coord(along, after);
        let flank_before = src.get_pixel(bx, by);
        let flank_after = src.get_pixel(ax, ay);

        for offset in (1 - BAND)..BAND {
            let across = center + offset;
            if across <= before || across >= after {
                continue;
            }
            let (x, y) = coord(along, across);
            let px = src.get_pixel(x, y);
            let sum = channel_sum(px);

            if offset.abs() <= HARD_BAND && light && sum < 3 * DARK_LINE {
                out.put_pixel(x, y, background);
                continue;
            }

            let jump = |flank: &Rgba<u8>| sum.abs_diff(channel_sum(flank)) > 3 * EDGE_DIFF;
            if jump(flank_before) || jump(flank_after) {
                let rgb = inverse_distance_blend(
                    flank_before,
                    (across - before) as f32,
                    flank_after,
                    (after - across) as f32,
                );
                let alpha = px[3];
                out.put_pixel(x, y, Rgba([rgb[0], rgb[1], rgb[2], alpha]));
            }
        }
    }
}

/// One cleaning pass over every internal seam.
fn erase_pass(src: &RgbaImage, layout: GridLayout) -> RgbaImage {
    let (background, light) = estimate_background(src);
    log::debug!(
        "seam pass: background {:?} ({})",
        background.0,
        if light { "light" } else { "dark" }
    );
    let mut out = src.clone();
    for x in layout.vertical_seams() {
        clean_seam(src, &mut out, Axis::Vertical, x, background, light);
    }
    for y in layout.horizontal_seams() {
        clean_seam(src, &mut out, Axis::Horizontal, y, background, light);
    }
    out
}

/// Remove residual divider lines at the internal boundaries of a grid.
///
/// A grid whose size is not exactly `2·cw × 4·ch` is stretched to that size
/// first; it is never rejected. Smoothed pixels keep their alpha; erased
/// line pixels take the corner-estimated background alpha.
#[must_use]
pub fn erase_seams(grid: &RgbaImage, layout: GridLayout) -> RgbaImage {
    let mut img = layout.resample_to_grid(grid);
    for _ in 0..PASSES {
        img = erase_pass(&img, layout);
    }
    img
}
