//! Flood-fill background removal.
//!
//! Generated stickers sit on a solid, near-white background that may also
//! surround white-ish character details (fur, clothing, highlights). A global
//! brightness threshold would erase those details, so only bright pixels
//! *connected to the image border* are made transparent:
//!
//! 1. every border pixel brighter than the threshold seeds a work list;
//! 2. a 4-connected breadth-first fill spreads through bright neighbours;
//! 3. reached pixels get alpha 0, everything else keeps its alpha.
//!
//! Brightness is the channel mean `(R+G+B)/3`. An optional [`Mask`] from a
//! manual retouch pass is applied on top of the automatic result.

use std::collections::VecDeque;

use image::{Rgba, RgbaImage};

use crate::codec;
use crate::error::{Error, Result};

/// Default brightness threshold for background pixels.
pub const DEFAULT_THRESHOLD: u8 = 240;

/// Lower bound of the user-tunable threshold range. Lower is more aggressive.
pub const MIN_TUNABLE_THRESHOLD: u8 = 200;

/// Per-pixel override from a manual retouch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskValue {
    /// Keep whatever the automatic pass decided.
    #[default]
    Unset,
    /// Restore the original pixel, fully as it was before removal.
    Protect,
    /// Force the pixel transparent.
    Delete,
}

/// Retouch mask with the same dimensions as the bitmap it refines.
///
/// A mask is created empty for one retouch session and applied once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    values: Vec<MaskValue>,
}

impl Mask {
    /// Create a mask where every pixel is [`MaskValue::Unset`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![MaskValue::Unset; width as usize * height as usize],
        }
    }

    /// Build a mask from a painted overlay image.
    ///
    /// Opaque (alpha ≥ 128) pixels whose green channel dominates mark
    /// [`MaskValue::Protect`]; red-dominant ones mark [`MaskValue::Delete`].
    /// Everything else is [`MaskValue::Unset`].
    #[must_use]
    pub fn from_image(img: &RgbaImage) -> Self {
        let values = img
            .pixels()
            .map(|&Rgba([r, g, b, a])| {
                if a < 128 {
                    MaskValue::Unset
                } else if g > r && g > b {
                    MaskValue::Protect
                } else if r > g && r > b {
                    MaskValue::Delete
                } else {
                    MaskValue::Unset
                }
            })
            .collect();
        Self {
            width: img.width(),
            height: img.height(),
            values,
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Value at `(x, y)`; out-of-bounds reads are [`MaskValue::Unset`].
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> MaskValue {
        self.index(x, y).map_or(MaskValue::Unset, |i| self.values[i])
    }

    /// Set a single pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: MaskValue) {
        if let Some(i) = self.index(x, y) {
            self.values[i] = value;
        }
    }

    /// Paint a filled circle (a brush stroke), clipped to the mask.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn paint(&mut self, cx: u32, cy: u32, radius: u32, value: MaskValue) {
        let r = i64::from(radius);
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        for y in (cy - r).max(0)..=(cy + r).min(i64::from(self.height) - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(i64::from(self.width) - 1) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.set(x as u32, y as u32, value);
                }
            }
        }
    }

    /// Reset every pixel to [`MaskValue::Unset`].
    pub fn clear(&mut self) {
        self.values.fill(MaskValue::Unset);
    }

    /// Whether no pixel carries an override.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| *v == MaskValue::Unset)
    }
}

/// Clamp an arbitrary integer threshold into the valid byte range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_threshold(threshold: i32) -> u8 {
    threshold.clamp(0, 255) as u8
}

/// Mark every pixel reachable from the border through bright pixels.
///
/// Returns a `width * height` row-major flag vector.
fn flood_from_border(img: &RgbaImage, threshold: u8) -> Vec<bool> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let threshold = u32::from(threshold);
    let mut remove = vec![false; w * h];
    let mut visited = vec![false; w * h];
    let mut queue = VecDeque::new();

    if w == 0 || h == 0 {
        return remove;
    }

    let raw = img.as_raw();
    // (R+G+B)/3 > threshold, compared without rounding.
    let bright = |idx: usize| {
        let p = &raw[idx * 4..idx * 4 + 3];
        u32::from(p[0]) + u32::from(p[1]) + u32::from(p[2]) > 3 * threshold
    };

    let mut seed = |idx: usize, queue: &mut VecDeque<usize>| {
        if !visited[idx] {
            visited[idx] = true;
            if bright(idx) {
                remove[idx] = true;
                queue.push_back(idx);
            }
        }
    };
    for x in 0..w {
        seed(x, &mut queue);
        seed((h - 1) * w + x, &mut queue);
    }
    for y in 0..h {
        seed(y * w, &mut queue);
        seed(y * w + w - 1, &mut queue);
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx % w, idx / w);
        let neighbours = [
            if x > 0 { Some(idx - 1) } else { None },
            if x + 1 < w { Some(idx + 1) } else { None },
            if y > 0 { Some(idx - w) } else { None },
            if y + 1 < h { Some(idx + w) } else { None },
        ];
        for n in neighbours.into_iter().flatten() {
            if visited[n] {
                continue;
            }
            visited[n] = true;
            if bright(n) {
                remove[n] = true;
                queue.push_back(n);
            }
        }
    }

    remove
}

/// Make the border-connected bright background of `img` transparent.
///
/// Only the alpha channel of removed pixels changes; RGB is preserved. The
/// threshold is clamped to `0..=255`. If a `mask` is given it is applied
/// after the automatic pass and wins per pixel: `Delete` forces alpha 0,
/// `Protect` restores the input pixel, `Unset` keeps the automatic result.
///
/// # Errors
///
/// Returns [`Error::MaskSize`] if the mask dimensions differ from `img`.
pub fn remove_background(
    img: &RgbaImage,
    threshold: i32,
    mask: Option<&Mask>,
) -> Result<RgbaImage> {
    if let Some(mask) = mask {
        if (mask.width, mask.height) != img.dimensions() {
            return Err(Error::MaskSize {
                mask_width: mask.width,
                mask_height: mask.height,
                width: img.width(),
                height: img.height(),
            });
        }
    }

    let threshold = clamp_threshold(threshold);
    let remove = flood_from_border(img, threshold);

    let mut out = img.clone();
    let mut removed = 0usize;
    for (px, &gone) in out.pixels_mut().zip(&remove) {
        if gone {
            px[3] = 0;
            removed += 1;
        }
    }

    if let Some(mask) = mask {
        for ((px, orig), value) in out.pixels_mut().zip(img.pixels()).zip(&mask.values) {
            match value {
                MaskValue::Unset => {}
                MaskValue::Protect => *px = *orig,
                MaskValue::Delete => px[3] = 0,
            }
        }
    }

    log::debug!(
        "background removal: {removed} of {} pixels cleared (threshold {threshold}, mask: {})",
        remove.len(),
        mask.is_some()
    );

    Ok(out)
}

/// Decode `bytes` and run [`remove_background`] on the result.
///
/// # Errors
///
/// Returns [`Error::Decode`] if `bytes` is not a valid image, or
/// [`Error::MaskSize`] as for [`remove_background`].
pub fn remove_background_encoded(
    bytes: &[u8],
    threshold: i32,
    mask: Option<&Mask>,
) -> Result<RgbaImage> {
    let img = codec::decode(bytes)?;
    remove_background(&img, threshold, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    /// White border, one-pixel white moat, black interior.
    fn moat_image() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(12, 12, WHITE);
        for y in 2..10 {
            for x in 2..10 {
                img.put_pixel(x, y, BLACK);
            }
        }
        img
    }

    #[test]
    fn dark_border_never_seeds() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([240, 240, 240, 255]));
        // Bright interior, but avg == threshold on the border does not seed.
        img.put_pixel(5, 5, WHITE);
        let out = remove_background(&img, 240, None).unwrap();
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn border_and_moat_removed_interior_kept() {
        let out = remove_background(&moat_image(), 240, None).unwrap();
        for (x, y, px) in out.enumerate_pixels() {
            let inside = (2..10).contains(&x) && (2..10).contains(&y);
            assert_eq!(px[3], if inside { 255 } else { 0 }, "pixel ({x},{y})");
        }
        // RGB untouched on removed pixels.
        assert_eq!(&out.get_pixel(0, 0).0[..3], &[255, 255, 255]);
    }

    #[test]
    fn enclosed_bright_region_survives() {
        // White ring of background, a black wall, then a white hole inside.
        let mut img = RgbaImage::from_pixel(11, 11, WHITE);
        for y in 2..9 {
            for x in 2..9 {
                let wall = x == 2 || x == 8 || y == 2 || y == 8;
                if wall {
                    img.put_pixel(x, y, BLACK);
                }
            }
        }
        let out = remove_background(&img, 240, None).unwrap();
        assert_eq!(out.get_pixel(5, 5)[3], 255);
        assert_eq!(out.get_pixel(0, 5)[3], 0);
        assert_eq!(out.get_pixel(2, 5)[3], 255);
    }

    #[test]
    fn flood_is_four_connected() {
        // A bright pixel touching the background only diagonally stays.
        let mut img = RgbaImage::from_pixel(5, 5, BLACK);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(1, 1, WHITE);
        let out = remove_background(&img, 240, None).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 1)[3], 255);
    }

    #[test]
    fn existing_alpha_is_kept_for_foreground() {
        let mut img = moat_image();
        img.put_pixel(5, 5, Rgba([0, 0, 0, 77]));
        let out = remove_background(&img, 240, None).unwrap();
        assert_eq!(out.get_pixel(5, 5)[3], 77);
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(clamp_threshold(-5), 0);
        assert_eq!(clamp_threshold(999), 255);

        let img = moat_image();
        // 255 can never be exceeded, so nothing is removed.
        let out = remove_background(&img, 1000, None).unwrap();
        assert!(out.pixels().all(|p| p[3] == 255));
        // Negative clamps to 0: everything non-black reachable goes.
        let out = remove_background(&img, -1, None).unwrap();
        assert_eq!(out.get_pixel(1, 1)[3], 0);
        assert_eq!(out.get_pixel(5, 5)[3], 255);
    }

    #[test]
    fn mask_overrides_threshold_result() {
        let img = moat_image();
        let mut mask = Mask::new(12, 12);
        mask.set(0, 0, MaskValue::Protect);
        mask.set(5, 5, MaskValue::Delete);

        let out = remove_background(&img, 240, Some(&mask)).unwrap();
        assert_eq!(*out.get_pixel(0, 0), WHITE);
        assert_eq!(out.get_pixel(5, 5)[3], 0);
        assert_eq!(&out.get_pixel(5, 5).0[..3], &[0, 0, 0]);
        // Unset pixels keep the automatic result.
        assert_eq!(out.get_pixel(1, 0)[3], 0);
        assert_eq!(out.get_pixel(6, 6)[3], 255);
    }

    #[test]
    fn mask_size_mismatch_is_an_error() {
        let mask = Mask::new(3, 3);
        let err = remove_background(&moat_image(), 240, Some(&mask)).unwrap_err();
        assert!(matches!(err, Error::MaskSize { mask_width: 3, width: 12, .. }));
    }

    #[test]
    fn mask_brush_paints_clipped_circle() {
        let mut mask = Mask::new(10, 10);
        assert!(mask.is_empty());
        mask.paint(0, 0, 2, MaskValue::Delete);
        assert_eq!(mask.get(0, 0), MaskValue::Delete);
        assert_eq!(mask.get(2, 0), MaskValue::Delete);
        assert_eq!(mask.get(2, 2), MaskValue::Unset);
        assert_eq!(mask.get(50, 50), MaskValue::Unset);
        mask.clear();
        assert!(mask.is_empty());
    }

    #[test]
    fn mask_from_painted_overlay() {
        let mut overlay = RgbaImage::new(3, 1);
        overlay.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
        overlay.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        overlay.put_pixel(2, 0, Rgba([255, 0, 0, 10]));
        let mask = Mask::from_image(&overlay);
        assert_eq!(mask.get(0, 0), MaskValue::Protect);
        assert_eq!(mask.get(1, 0), MaskValue::Delete);
        assert_eq!(mask.get(2, 0), MaskValue::Unset);
    }

    #[test]
    fn encoded_input_must_decode() {
        let err = remove_background_encoded(b"garbage", 240, None).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        let bytes = codec::encode_png(&moat_image()).unwrap();
        let out = remove_background_encoded(&bytes, 240, None).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
    }
}
