//! Collaborator abstraction for the systems the routine talks to.
//!
//! Four traits, one per external concern:
//! - [`MeasurementSource`]: deforestation alerts for a period
//! - [`CountryCatalog`]: the ordered country list and per-country details
//! - [`BaseMapProvider`]: the raster map of a country
//! - [`Publisher`]: where the rendered map and message go
//!
//! Bundled implementations live in the submodules; tests plug in their own.

pub mod countries;
pub mod glad;
pub mod http;
pub mod maps;
pub mod publish;
pub mod static_adapter;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use deforest_core::MapImage;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

// ──────────────────────────────────────────────
// Period
// ──────────────────────────────────────────────

/// The time window a measurement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Period {
    /// The single day `lag_days` before `now`, or `None` when that day is
    /// outside the representable date range.
    ///
    /// Alerts take several days to be reported, so the routine always
    /// looks at a day far enough in the past to be complete.
    pub fn lagged(now: OffsetDateTime, lag_days: i64) -> Option<Self> {
        let lag = lag_days.checked_mul(86_400).map(time::Duration::seconds)?;
        let day = now.checked_sub(lag)?;
        Some(Period {
            start: day,
            end: day,
        })
    }

    pub fn start_date(&self) -> Date {
        self.start.date()
    }

    pub fn end_date(&self) -> Date {
        self.end.date()
    }

    /// `YYYY-MM-DD,YYYY-MM-DD`, the form alert APIs take as a query value.
    pub fn query_value(&self) -> String {
        format!("{},{}", self.start_date(), self.end_date())
    }
}

// ──────────────────────────────────────────────
// Collaborator data
// ──────────────────────────────────────────────

/// Result of asking the measurement source about a period.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Deforested area reported for the period, km².
    pub area_km2: f64,
    /// Whatever the source returned, kept verbatim for the fetch log.
    pub raw_log: serde_json::Value,
}

/// One entry of the ordered country list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// ISO 3166-1 alpha-3 code.
    pub code: String,
    pub name: String,
    /// Forest area to deforest before moving to the next country, km².
    #[serde(rename = "area")]
    pub total_area: f64,
    /// Land area depicted by the base map, km². Looked up remotely when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_area: Option<f64>,
}

/// Per-country data needed to render its map.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryDetails {
    pub code: String,
    /// Land area depicted by the base map, km².
    pub area: f64,
    /// URL or path the base map is loaded from.
    pub map_image_ref: String,
}

// ──────────────────────────────────────────────
// AdapterError
// ──────────────────────────────────────────────

/// Errors that can occur when a collaborator is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The collaborator is switched off in configuration.
    NotConfigured { adapter: String },
    /// A request to the external system failed.
    FetchFailed { source_id: String, message: String },
    /// The external system answered with something unusable.
    InvalidResponse { source_id: String, message: String },
    /// A country code is not known to the catalog.
    UnknownCountry { code: String },
    /// Configuration error (missing URL, unreadable file, etc.).
    ConfigError { message: String },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::NotConfigured { adapter } => {
                write!(f, "adapter '{}' is not configured", adapter)
            }
            AdapterError::FetchFailed { source_id, message } => {
                write!(f, "request to '{}' failed: {}", source_id, message)
            }
            AdapterError::InvalidResponse { source_id, message } => {
                write!(f, "invalid response from '{}': {}", source_id, message)
            }
            AdapterError::UnknownCountry { code } => {
                write!(f, "country '{}' not found in catalog", code)
            }
            AdapterError::ConfigError { message } => {
                write!(f, "adapter config error: {}", message)
            }
        }
    }
}

impl std::error::Error for AdapterError {}

// ──────────────────────────────────────────────
// Collaborator traits
// ──────────────────────────────────────────────

/// Reports how much forest was lost in a period.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Fetch the alerts for `period`.
    ///
    /// Sources issuing several requests wait `request_delay` between them.
    async fn get_alerts(
        &self,
        period: &Period,
        request_delay: Duration,
    ) -> Result<Measurement, AdapterError>;

    /// Returns this adapter's identifier (e.g. "glad", "static").
    fn adapter_id(&self) -> &str;
}

/// The fixed, ordered list of countries and their rendering details.
#[async_trait]
pub trait CountryCatalog: Send + Sync {
    /// All countries in deforestation order.
    fn list(&self) -> &[CountryRecord];

    /// Land area and base-map reference for `code`.
    async fn details(&self, code: &str) -> Result<CountryDetails, AdapterError>;
}

/// Loads base-map rasters.
#[async_trait]
pub trait BaseMapProvider: Send + Sync {
    /// Load the map at `map_image_ref` into a fresh in-memory image.
    async fn fetch_image(&self, map_image_ref: &str) -> Result<MapImage, AdapterError>;
}

/// Publishes a rendered map together with its message.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, image: &MapImage, message: &str) -> Result<(), AdapterError>;

    /// Returns this adapter's identifier (e.g. "dir", "webhook").
    fn adapter_id(&self) -> &str;
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn lagged_period_is_one_day_in_the_past() {
        let period = Period::lagged(datetime!(2026-10-17 09:30 UTC), 7).unwrap();
        assert_eq!(period.start, datetime!(2026-10-10 09:30 UTC));
        assert_eq!(period.start, period.end);
        assert_eq!(period.query_value(), "2026-10-10,2026-10-10");
    }

    #[test]
    fn lag_beyond_the_calendar_has_no_period() {
        let now = datetime!(2026-10-17 09:30 UTC);
        assert_eq!(Period::lagged(now, 100_000_000), None);
        assert_eq!(Period::lagged(now, i64::MAX), None);
    }

    #[test]
    fn country_record_reads_list_json() {
        let rec: CountryRecord =
            serde_json::from_str(r#"{"code": "BRA", "name": "Brazil", "area": 4935380}"#)
                .unwrap();
        assert_eq!(rec.total_area, 4_935_380.0);
        assert_eq!(rec.land_area, None);
    }

    #[test]
    fn display_messages() {
        let e = AdapterError::UnknownCountry {
            code: "XYZ".to_string(),
        };
        assert_eq!(e.to_string(), "country 'XYZ' not found in catalog");
        let e = AdapterError::NotConfigured {
            adapter: "publisher".to_string(),
        };
        assert_eq!(e.to_string(), "adapter 'publisher' is not configured");
    }
}
