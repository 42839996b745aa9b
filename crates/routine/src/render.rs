//! Turning areas into a painted map.
//!
//! A render paints three layers over a fresh copy of the base map, in order:
//!
//! 1. the whole country: land color → healthy color
//! 2. loss accumulated before this period: healthy → previous-loss color
//! 3. loss measured in this period: healthy → new-loss color
//!
//! Layers 2 and 3 both read the healthy color as their source, so the new
//! loss is painted next to, never over, the older loss.

use std::io::Cursor;

use deforest_core::{
    compute_ratio, paint, to_pixels, to_visible_pixels, AreaError, MapImage, PixelRatio,
};
use image::Rgba;
use serde::Serialize;

use crate::adapter::{CountryDetails, CountryRecord};

/// Colors used by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Land color of the unmodified base maps.
    pub land: Rgba<u8>,
    /// Forest not yet lost.
    pub healthy: Rgba<u8>,
    /// Loss from previous periods.
    pub previous_loss: Rgba<u8>,
    /// Loss from the current period.
    pub new_loss: Rgba<u8>,
}

/// Everything known about the country drawn in one cycle.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub country: CountryRecord,
    pub details: CountryDetails,
    pub base_map: MapImage,
    pub ratio: PixelRatio,
}

impl RenderContext {
    /// Compute the map density for `base_map`.
    ///
    /// Fails with `AreaError::InvalidArea` when the country's forest area or
    /// land area is not positive.
    pub fn new(
        country: CountryRecord,
        details: CountryDetails,
        base_map: MapImage,
        land: Rgba<u8>,
    ) -> Result<Self, AreaError> {
        if !country.total_area.is_finite() || country.total_area <= 0.0 {
            return Err(AreaError::InvalidArea {
                area: country.total_area,
            });
        }
        let ratio = compute_ratio(&base_map, details.area, land)?;
        Ok(RenderContext {
            country,
            details,
            base_map,
            ratio,
        })
    }

    /// Map a forest-loss area onto the depicted land area.
    ///
    /// The base map shows the whole country, but losses are measured
    /// against its forest, so `area / forest` of the land gets painted.
    pub fn land_equivalent(&self, area_km2: f64) -> f64 {
        area_km2 / self.country.total_area * self.details.area
    }

    /// Pixel budgets for a prior accumulated area and a new area.
    pub fn budgets(&self, prior_km2: f64, new_km2: f64) -> PixelBudgets {
        PixelBudgets {
            whole: to_pixels(self.details.area, &self.ratio),
            prior: to_pixels(self.land_equivalent(prior_km2), &self.ratio),
            new: to_visible_pixels(self.land_equivalent(new_km2), &self.ratio),
        }
    }

    /// Paint the three layers onto a copy of the base map.
    pub fn render(&self, budgets: &PixelBudgets, palette: &Palette) -> MapImage {
        let mut image = self.base_map.clone();

        let whole = paint(&mut image, budgets.whole, palette.healthy, palette.land);
        let prior = paint(&mut image, budgets.prior, palette.previous_loss, palette.healthy);
        let new = paint(&mut image, budgets.new, palette.new_loss, palette.healthy);

        tracing::debug!(
            whole = whole.painted,
            prior = prior.painted,
            new = new.painted,
            "painted map layers"
        );
        image
    }
}

/// Pixel counts for the three render layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelBudgets {
    pub whole: u64,
    pub prior: u64,
    pub new: u64,
}

/// Encode a map as PNG bytes.
pub fn encode_png(map: &MapImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    map.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deforest_core::count_color;

    const LAND: Rgba<u8> = Rgba([0xd3, 0xd3, 0xd3, 255]);
    const SEA: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn palette() -> Palette {
        Palette {
            land: LAND,
            healthy: Rgba([0x22, 0x8b, 0x22, 255]),
            previous_loss: Rgba([0x8b, 0x45, 0x13, 255]),
            new_loss: Rgba([0xf6, 0x0b, 0x2a, 255]),
        }
    }

    /// 10x10 map with 50 land pixels; forest 100 km², land 200 km².
    fn context() -> RenderContext {
        let map = MapImage::from_fn(10, 10, |x, _| if x < 5 { LAND } else { SEA });
        RenderContext::new(
            CountryRecord {
                code: "TST".to_string(),
                name: "Testland".to_string(),
                total_area: 100.0,
                land_area: Some(200.0),
            },
            CountryDetails {
                code: "TST".to_string(),
                area: 200.0,
                map_image_ref: "TST.png".to_string(),
            },
            map,
            LAND,
        )
        .unwrap()
    }

    #[test]
    fn budgets_scale_forest_loss_to_land_pixels() {
        let ctx = context();
        assert_eq!(ctx.land_equivalent(30.0), 60.0);
        let budgets = ctx.budgets(20.0, 30.0);
        assert_eq!(budgets.whole, 50);
        assert_eq!(budgets.prior, 10);
        assert_eq!(budgets.new, 15);
    }

    #[test]
    fn tiny_new_area_still_gets_one_pixel() {
        let budgets = context().budgets(0.0, 0.01);
        assert_eq!(budgets.new, 1);
        assert_eq!(budgets.prior, 0);
    }

    #[test]
    fn render_layers_do_not_overlap() {
        let ctx = context();
        let p = palette();
        let image = ctx.render(&ctx.budgets(20.0, 30.0), &p);

        assert_eq!(count_color(&image, p.previous_loss), 10);
        assert_eq!(count_color(&image, p.new_loss), 15);
        assert_eq!(count_color(&image, p.healthy), 25);
        assert_eq!(count_color(&image, LAND), 0);
        assert_eq!(count_color(&image, SEA), 50);
        // The base map itself is left untouched.
        assert_eq!(count_color(&ctx.base_map, LAND), 50);
    }

    #[test]
    fn zero_forest_area_is_invalid() {
        let mut ctx = context();
        ctx.country.total_area = 0.0;
        let result = RenderContext::new(ctx.country, ctx.details, ctx.base_map, LAND);
        assert!(matches!(result, Err(AreaError::InvalidArea { .. })));
    }

    #[test]
    fn zero_land_area_is_invalid() {
        let mut ctx = context();
        ctx.details.area = 0.0;
        let result = RenderContext::new(ctx.country, ctx.details, ctx.base_map, LAND);
        assert!(matches!(result, Err(AreaError::InvalidArea { .. })));
    }

    #[test]
    fn png_encoding_produces_png_signature() {
        let png = encode_png(&MapImage::new(2, 2)).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
