//! Budgeted recoloring of map pixels.
//!
//! The scan is column-major over the full bitmap: columns left to right,
//! and within each column rows top to bottom. Every pixel is visited at
//! most once, so for a given image and budget the recolored set is always
//! the same. Golden-image tests rely on this order.
//!
//! Layers compose by calling [`paint`] repeatedly with the same `source`
//! (the still-unpainted land color): pixels recolored by an earlier layer
//! no longer match `source` and are skipped by later ones.

use image::Rgba;
use serde::Serialize;

use crate::MapImage;

/// Outcome of one [`paint`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaintReport {
    /// Pixels recolored by this call.
    pub painted: u64,
    /// Budget left when the scan ended (non-zero means the source color
    /// ran out first).
    pub unspent: u64,
}

/// Recolor up to `budget` pixels of `source` color to `target`.
pub fn paint(
    image: &mut MapImage,
    budget: u64,
    target: Rgba<u8>,
    source: Rgba<u8>,
) -> PaintReport {
    let (width, height) = image.dimensions();
    let mut remaining = budget;

    'scan: for x in 0..width {
        for y in 0..height {
            if remaining == 0 {
                break 'scan;
            }
            let pixel = image.get_pixel_mut(x, y);
            if *pixel == source {
                *pixel = target;
                remaining -= 1;
            }
        }
    }

    PaintReport {
        painted: budget - remaining,
        unspent: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::count_color;

    const LAND: Rgba<u8> = Rgba([0xd3, 0xd3, 0xd3, 255]);
    const SEA: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([0xf6, 0x0b, 0x2a, 255]);
    const BROWN: Rgba<u8> = Rgba([0x8b, 0x45, 0x13, 255]);

    /// Checkerboard-ish map: land wherever (x + y) is not a multiple of 3.
    fn patchy_map(width: u32, height: u32) -> MapImage {
        MapImage::from_fn(width, height, |x, y| {
            if (x + y) % 3 == 0 {
                SEA
            } else {
                LAND
            }
        })
    }

    #[test]
    fn paints_exactly_min_of_budget_and_matches() {
        let base = patchy_map(9, 5);
        let land = count_color(&base, LAND);

        for budget in [0, 1, 7, land - 1, land, land + 1, land * 4] {
            let mut img = base.clone();
            let report = paint(&mut img, budget, RED, LAND);
            assert_eq!(report.painted, budget.min(land), "budget {budget}");
            assert_eq!(count_color(&img, RED), budget.min(land));
            assert_eq!(report.unspent, budget - report.painted);
        }
    }

    #[test]
    fn non_matching_pixels_are_never_touched() {
        let base = patchy_map(6, 6);
        let sea = count_color(&base, SEA);
        let mut img = base.clone();
        paint(&mut img, u64::MAX, RED, LAND);
        assert_eq!(count_color(&img, SEA), sea);
        assert_eq!(count_color(&img, LAND), 0);
    }

    #[test]
    fn scan_is_column_major() {
        let mut img = MapImage::from_pixel(3, 3, LAND);
        paint(&mut img, 4, RED, LAND);

        // First column fully, then the top of the second column.
        for y in 0..3 {
            assert_eq!(*img.get_pixel(0, y), RED);
        }
        assert_eq!(*img.get_pixel(1, 0), RED);
        assert_eq!(*img.get_pixel(1, 1), LAND);
        assert_eq!(*img.get_pixel(2, 0), LAND);
    }

    #[test]
    fn repeated_calls_select_identical_pixels() {
        let base = patchy_map(13, 11);
        let mut a = base.clone();
        let mut b = base.clone();
        paint(&mut a, 37, RED, LAND);
        paint(&mut b, 37, RED, LAND);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn later_layers_do_not_overwrite_earlier_ones() {
        let mut img = MapImage::from_pixel(4, 4, LAND);
        paint(&mut img, 5, BROWN, LAND);
        let second = paint(&mut img, 3, RED, LAND);

        assert_eq!(second.painted, 3);
        assert_eq!(count_color(&img, BROWN), 5);
        assert_eq!(count_color(&img, RED), 3);
        assert_eq!(count_color(&img, LAND), 8);
        // The second layer starts right where the first one stopped.
        assert_eq!(*img.get_pixel(1, 0), BROWN);
        assert_eq!(*img.get_pixel(1, 1), RED);
    }

    #[test]
    fn empty_image_paints_nothing() {
        let mut img = MapImage::new(0, 0);
        let report = paint(&mut img, 10, RED, LAND);
        assert_eq!(report.painted, 0);
        assert_eq!(report.unspent, 10);
    }
}
