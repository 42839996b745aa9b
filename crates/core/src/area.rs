//! Area unit conversion between km² and map pixels.
//!
//! A base map depicts a country whose land area is known. Counting the
//! land-colored pixels and dividing by that area gives the map's density
//! in pixels per km², which turns any measured area into a pixel budget
//! for [`crate::paint`].
//!
//! Computing the ratio scans the whole image; callers compute it once
//! per render and pass the [`PixelRatio`] around.

use image::Rgba;
use serde::Serialize;

use crate::error::AreaError;
use crate::MapImage;

/// Pixels-per-km² density of one base map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRatio {
    /// Number of pixels matching the land color.
    pub land_pixels: u64,
    /// Reference area the land pixels represent.
    pub area_km2: f64,
    /// `land_pixels / area_km2`.
    pub per_km2: f64,
}

/// Count the pixels in `image` exactly equal to `color`.
pub fn count_color(image: &MapImage, color: Rgba<u8>) -> u64 {
    image.pixels().filter(|p| **p == color).count() as u64
}

/// Compute the pixel density of `image` for a country of `country_area` km².
///
/// Returns `Err(AreaError::InvalidArea)` unless `country_area` is a
/// positive, finite number.
pub fn compute_ratio(
    image: &MapImage,
    country_area: f64,
    land: Rgba<u8>,
) -> Result<PixelRatio, AreaError> {
    if !country_area.is_finite() || country_area <= 0.0 {
        return Err(AreaError::InvalidArea { area: country_area });
    }

    let land_pixels = count_color(image, land);
    Ok(PixelRatio {
        land_pixels,
        area_km2: country_area,
        per_km2: land_pixels as f64 / country_area,
    })
}

/// Convert an area into a pixel count, rounding to the nearest pixel.
///
/// Negative and non-finite products yield 0.
pub fn to_pixels(area_km2: f64, ratio: &PixelRatio) -> u64 {
    let pixels = (area_km2 * ratio.per_km2).round();
    if pixels.is_finite() && pixels > 0.0 {
        pixels as u64
    } else {
        0
    }
}

/// Like [`to_pixels`], but never returns 0 for a positive area.
pub fn to_visible_pixels(area_km2: f64, ratio: &PixelRatio) -> u64 {
    let pixels = to_pixels(area_km2, ratio);
    if area_km2 > 0.0 {
        pixels.max(1)
    } else {
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAND: Rgba<u8> = Rgba([0xd3, 0xd3, 0xd3, 255]);
    const SEA: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// 10x10 map whose left `land_columns` columns are land.
    fn map_with_land_columns(land_columns: u32) -> MapImage {
        MapImage::from_fn(10, 10, |x, _| if x < land_columns { LAND } else { SEA })
    }

    #[test]
    fn ratio_is_land_pixels_over_area() {
        let map = map_with_land_columns(4);
        let ratio = compute_ratio(&map, 20.0, LAND).unwrap();
        assert_eq!(ratio.land_pixels, 40);
        assert_eq!(ratio.per_km2, 2.0);
    }

    #[test]
    fn zero_negative_and_nan_areas_are_rejected() {
        let map = map_with_land_columns(4);
        for area in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compute_ratio(&map, area, LAND),
                Err(AreaError::InvalidArea { .. })
            ));
        }
    }

    #[test]
    fn full_area_round_trips_to_land_pixel_count() {
        let map = map_with_land_columns(7);
        for area in [1.0, 3.0, 70.0, 1_234.5, 8_515_767.0] {
            let ratio = compute_ratio(&map, area, LAND).unwrap();
            let pixels = to_pixels(area, &ratio);
            assert!(pixels.abs_diff(70) <= 1, "area {area}: got {pixels}");
        }
    }

    #[test]
    fn to_pixels_rounds_to_nearest() {
        let ratio = PixelRatio {
            land_pixels: 10,
            area_km2: 4.0,
            per_km2: 2.5,
        };
        assert_eq!(to_pixels(1.0, &ratio), 3);
        assert_eq!(to_pixels(0.1, &ratio), 0);
        assert_eq!(to_pixels(0.3, &ratio), 1);
        assert_eq!(to_pixels(-2.0, &ratio), 0);
    }

    #[test]
    fn visible_pixels_floor_at_one_for_positive_area() {
        let ratio = PixelRatio {
            land_pixels: 1,
            area_km2: 1_000.0,
            per_km2: 0.001,
        };
        assert_eq!(to_pixels(5.0, &ratio), 0);
        assert_eq!(to_visible_pixels(5.0, &ratio), 1);
        assert_eq!(to_visible_pixels(0.0, &ratio), 0);
    }

    #[test]
    fn map_without_land_has_zero_density() {
        let map = map_with_land_columns(0);
        let ratio = compute_ratio(&map, 100.0, LAND).unwrap();
        assert_eq!(ratio.per_km2, 0.0);
        assert_eq!(to_pixels(100.0, &ratio), 0);
    }
}
