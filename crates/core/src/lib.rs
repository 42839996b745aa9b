//! deforest-core: the arithmetic and raster half of the deforest bot.
//!
//! # Public API
//!
//! - [`area`] -- pixels-per-km² ratio and area-to-pixel conversion
//! - [`paint`] -- deterministic, budgeted recoloring of map pixels
//! - [`color`] -- CSS hex color parsing into RGBA pixels
//! - [`format`] -- human-readable area and date strings used in messages

pub mod area;
pub mod color;
pub mod error;
pub mod format;
pub mod paint;

// ── Convenience re-exports ───────────────────────────────────────────

pub use area::{compute_ratio, count_color, to_pixels, to_visible_pixels, PixelRatio};
pub use color::parse_hex;
pub use error::{AreaError, ColorError};
pub use format::{format_area, format_date};
pub use paint::{paint, PaintReport};

/// The raster type every map operation works on.
pub type MapImage = image::RgbaImage;
