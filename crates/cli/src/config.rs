//! `deforest.toml` configuration.
//!
//! Every field has a default, so an empty (or missing) file is a valid
//! configuration. After parsing, `DEFOREST_*` environment variables
//! override individual fields. The resulting [`Config`] is built once at
//! startup and handed to everything that needs it.
//!
//! # Example
//!
//! ```toml
//! log_level = "info"
//!
//! [routine]
//! lag_days = 7
//! request_delay_ms = 400
//! min_area_km2 = 1.0
//!
//! [colors]
//! land = "#d3d3d3"
//! healthy = "#3f9b0b"
//! previous = "#8b4513"
//! new = "#f60b2a"
//!
//! [storage]
//! kind = "file"
//! dir = "data"
//!
//! [countries]
//! list = "countries.json"
//! details_url = "https://restcountries.com/v3.1"
//!
//! [maps]
//! template = "https://gadm.org/img/480/gadm/{code}/{code}.png"
//!
//! [measurement]
//! kind = "glad"
//! base_url = "https://production-api.globalforestwatch.org/v1"
//!
//! [publisher]
//! kind = "dir"
//! dir = "published"
//!
//! [server]
//! port = 8080
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use deforest_core::parse_hex;
use deforest_routine::{Palette, RoutineSettings};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "deforest.toml";

/// Largest accepted `routine.lag_days`.
pub const MAX_LAG_DAYS: i64 = 3650;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default `tracing` filter; `RUST_LOG` wins when set.
    pub log_level: String,
    pub routine: RoutineSection,
    pub colors: ColorSection,
    pub storage: StorageSection,
    pub countries: CountriesSection,
    pub maps: MapsSection,
    pub measurement: MeasurementSection,
    pub publisher: PublisherSection,
    pub server: ServerSection,
}

/// `[routine]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineSection {
    pub lag_days: i64,
    pub request_delay_ms: u64,
    pub min_area_km2: f64,
}

/// `[colors]`, CSS hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSection {
    pub land: String,
    pub healthy: String,
    pub previous: String,
    pub new: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Memory,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub kind: StorageKind,
    /// Directory of the JSON-lines files (`kind = "file"`).
    pub dir: PathBuf,
}

/// `[countries]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountriesSection {
    /// Ordered country list, `[{"code", "name", "area", "land_area"?}]`.
    pub list: PathBuf,
    /// REST countries endpoint for land areas missing from the list.
    pub details_url: Option<String>,
}

/// `[maps]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsSection {
    /// URL or path of a base map; `{code}` is replaced by the country code.
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Glad,
    Static,
}

/// `[measurement]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSection {
    pub kind: MeasurementKind,
    /// Alerts API root (`kind = "glad"`).
    pub base_url: String,
    /// Country codes queried; empty means every country in the list.
    pub codes: Vec<String>,
    pub auth_token: Option<String>,
    /// Area reported for every period (`kind = "static"`).
    pub static_area_km2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Dir,
    Webhook,
    Disabled,
}

/// `[publisher]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSection {
    pub kind: PublisherKind,
    pub dir: PathBuf,
    pub url: Option<String>,
    pub auth_token: Option<String>,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            routine: RoutineSection::default(),
            colors: ColorSection::default(),
            storage: StorageSection::default(),
            countries: CountriesSection::default(),
            maps: MapsSection::default(),
            measurement: MeasurementSection::default(),
            publisher: PublisherSection::default(),
            server: ServerSection::default(),
        }
    }
}

impl Default for RoutineSection {
    fn default() -> Self {
        RoutineSection {
            lag_days: 7,
            request_delay_ms: 400,
            min_area_km2: 1.0,
        }
    }
}

impl Default for ColorSection {
    fn default() -> Self {
        ColorSection {
            land: "#d3d3d3".to_string(),
            healthy: "#3f9b0b".to_string(),
            previous: "#8b4513".to_string(),
            new: "#f60b2a".to_string(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        StorageSection {
            kind: StorageKind::File,
            dir: PathBuf::from("data"),
        }
    }
}

impl Default for CountriesSection {
    fn default() -> Self {
        CountriesSection {
            list: PathBuf::from("countries.json"),
            details_url: Some("https://restcountries.com/v3.1".to_string()),
        }
    }
}

impl Default for MapsSection {
    fn default() -> Self {
        MapsSection {
            template: "https://gadm.org/img/480/gadm/{code}/{code}.png".to_string(),
        }
    }
}

impl Default for MeasurementSection {
    fn default() -> Self {
        MeasurementSection {
            kind: MeasurementKind::Glad,
            base_url: "https://production-api.globalforestwatch.org/v1".to_string(),
            codes: Vec::new(),
            auth_token: None,
            static_area_km2: 0.0,
        }
    }
}

impl Default for PublisherSection {
    fn default() -> Self {
        PublisherSection {
            kind: PublisherKind::Dir,
            dir: PathBuf::from("published"),
            url: None,
            auth_token: None,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection { port: 8080 }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl Config {
    /// Read `path` (or `deforest.toml` when present) and apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file without environment overrides.
    pub fn read(path: &Path) -> Result<Config, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(content)
    }

    /// Override fields from `DEFOREST_*` variables, looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), String> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DEFOREST_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("DEFOREST_LAG_DAYS") {
            self.routine.lag_days = parse_number("DEFOREST_LAG_DAYS", &v)?;
        }
        if let Some(v) = get("DEFOREST_REQUEST_DELAY_MS") {
            self.routine.request_delay_ms = parse_number("DEFOREST_REQUEST_DELAY_MS", &v)?;
        }
        if let Some(v) = get("DEFOREST_MIN_AREA_KM2") {
            self.routine.min_area_km2 = parse_number("DEFOREST_MIN_AREA_KM2", &v)?;
        }
        if let Some(v) = get("DEFOREST_COLOR_LAND") {
            self.colors.land = v;
        }
        if let Some(v) = get("DEFOREST_COLOR_HEALTHY") {
            self.colors.healthy = v;
        }
        if let Some(v) = get("DEFOREST_COLOR_PREVIOUS") {
            self.colors.previous = v;
        }
        if let Some(v) = get("DEFOREST_COLOR_NEW") {
            self.colors.new = v;
        }
        if let Some(v) = get("DEFOREST_STORAGE_KIND") {
            self.storage.kind = parse_kind("DEFOREST_STORAGE_KIND", &v)?;
        }
        if let Some(v) = get("DEFOREST_STORAGE_DIR") {
            self.storage.dir = PathBuf::from(v);
        }
        if let Some(v) = get("DEFOREST_COUNTRIES_LIST") {
            self.countries.list = PathBuf::from(v);
        }
        if let Some(v) = get("DEFOREST_COUNTRIES_DETAILS_URL") {
            self.countries.details_url = Some(v);
        }
        if let Some(v) = get("DEFOREST_MAPS_TEMPLATE") {
            self.maps.template = v;
        }
        if let Some(v) = get("DEFOREST_MEASUREMENT_KIND") {
            self.measurement.kind = parse_kind("DEFOREST_MEASUREMENT_KIND", &v)?;
        }
        if let Some(v) = get("DEFOREST_MEASUREMENT_URL") {
            self.measurement.base_url = v;
        }
        if let Some(v) = get("DEFOREST_MEASUREMENT_TOKEN") {
            self.measurement.auth_token = Some(v);
        }
        if let Some(v) = get("DEFOREST_STATIC_AREA_KM2") {
            self.measurement.static_area_km2 = parse_number("DEFOREST_STATIC_AREA_KM2", &v)?;
        }
        if let Some(v) = get("DEFOREST_PUBLISHER_KIND") {
            self.publisher.kind = parse_kind("DEFOREST_PUBLISHER_KIND", &v)?;
        }
        if let Some(v) = get("DEFOREST_PUBLISHER_DIR") {
            self.publisher.dir = PathBuf::from(v);
        }
        if let Some(v) = get("DEFOREST_PUBLISHER_URL") {
            self.publisher.url = Some(v);
        }
        if let Some(v) = get("DEFOREST_PUBLISHER_TOKEN") {
            self.publisher.auth_token = Some(v);
        }
        if let Some(v) = get("DEFOREST_PORT") {
            self.server.port = parse_number("DEFOREST_PORT", &v)?;
        }
        Ok(())
    }

    /// Parse the `[colors]` section.
    pub fn palette(&self) -> Result<Palette, String> {
        let color = |field: &str, value: &str| {
            parse_hex(value).map_err(|e| format!("colors.{}: {}", field, e))
        };
        Ok(Palette {
            land: color("land", &self.colors.land)?,
            healthy: color("healthy", &self.colors.healthy)?,
            previous_loss: color("previous", &self.colors.previous)?,
            new_loss: color("new", &self.colors.new)?,
        })
    }

    /// Routine tunables derived from `[routine]` and `[colors]`.
    pub fn routine_settings(&self) -> Result<RoutineSettings, String> {
        if !(0..=MAX_LAG_DAYS).contains(&self.routine.lag_days) {
            return Err(format!(
                "routine.lag_days must be between 0 and {}, got {}",
                MAX_LAG_DAYS, self.routine.lag_days
            ));
        }
        Ok(RoutineSettings {
            lag_days: self.routine.lag_days,
            request_delay: Duration::from_millis(self.routine.request_delay_ms),
            min_area_km2: self.routine.min_area_km2,
            palette: self.palette()?,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{}: invalid value '{}': {}", key, value, e))
}

fn parse_kind<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|e| format!("{}: {}", key, e))
}
