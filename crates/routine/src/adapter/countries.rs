//! Country catalog: an ordered JSON list plus optional remote land areas.
//!
//! The list file is an array in deforestation order:
//!
//! ```json
//! [
//!   {"code": "URY", "name": "Uruguay", "area": 20310, "land_area": 176215},
//!   {"code": "BRA", "name": "Brazil", "area": 4935380}
//! ]
//! ```
//!
//! `area` is the forest area to deforest. The land area depicted by the
//! base map comes from `land_area` when present, otherwise from a
//! REST-countries style endpoint: `GET {details_url}/alpha/{code}`,
//! answering either `{"area": ..}` or `[{"area": ..}]`.

use std::path::Path;

use async_trait::async_trait;

use super::http::get_json;
use super::{AdapterError, CountryCatalog, CountryDetails, CountryRecord};

/// [`CountryCatalog`] over a fixed, ordered list.
pub struct ListCatalog {
    countries: Vec<CountryRecord>,
    details_url: Option<String>,
    map_ref_template: String,
}

impl ListCatalog {
    /// Build a catalog from `countries`. `map_ref_template` is a URL or path
    /// in which every `{code}` is replaced by the country code.
    pub fn new(countries: Vec<CountryRecord>, map_ref_template: &str) -> Self {
        ListCatalog {
            countries,
            details_url: None,
            map_ref_template: map_ref_template.to_string(),
        }
    }

    /// Read the ordered list from a JSON file.
    pub fn load(path: &Path, map_ref_template: &str) -> Result<Self, AdapterError> {
        let content = std::fs::read_to_string(path).map_err(|e| AdapterError::ConfigError {
            message: format!("could not read country list '{}': {}", path.display(), e),
        })?;
        let countries: Vec<CountryRecord> =
            serde_json::from_str(&content).map_err(|e| AdapterError::ConfigError {
                message: format!("could not parse country list '{}': {}", path.display(), e),
            })?;
        Ok(Self::new(countries, map_ref_template))
    }

    /// Look up land areas missing from the list at `base_url`.
    pub fn with_details_url(mut self, base_url: &str) -> Self {
        self.details_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn map_ref(&self, code: &str) -> String {
        self.map_ref_template.replace("{code}", code)
    }

    /// Extract `area` from a REST-countries response (object or one-element array).
    pub fn parse_land_area(body: &serde_json::Value) -> Result<f64, AdapterError> {
        let entry = match body {
            serde_json::Value::Array(items) => items.first(),
            other => Some(other),
        };
        entry
            .and_then(|e| e["area"].as_f64())
            .ok_or_else(|| AdapterError::InvalidResponse {
                source_id: "countries".to_string(),
                message: "expected a numeric 'area' field".to_string(),
            })
    }
}

#[async_trait]
impl CountryCatalog for ListCatalog {
    fn list(&self) -> &[CountryRecord] {
        &self.countries
    }

    async fn details(&self, code: &str) -> Result<CountryDetails, AdapterError> {
        let record = self
            .countries
            .iter()
            .find(|c| c.code == code)
            .ok_or_else(|| AdapterError::UnknownCountry {
                code: code.to_string(),
            })?;

        let area = match (record.land_area, &self.details_url) {
            (Some(area), _) => area,
            (None, Some(base)) => {
                let body = get_json("countries", format!("{}/alpha/{}", base, code), None).await?;
                Self::parse_land_area(&body)?
            }
            (None, None) => {
                return Err(AdapterError::ConfigError {
                    message: format!(
                        "country '{}' has no land_area and no details URL is configured",
                        code
                    ),
                })
            }
        };

        Ok(CountryDetails {
            code: code.to_string(),
            area,
            map_image_ref: self.map_ref(code),
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn uruguay() -> CountryRecord {
        CountryRecord {
            code: "URY".to_string(),
            name: "Uruguay".to_string(),
            total_area: 20_310.0,
            land_area: Some(176_215.0),
        }
    }

    #[tokio::test]
    async fn details_use_list_land_area_and_template() {
        let catalog = ListCatalog::new(vec![uruguay()], "maps/{code}/{code}.png");
        let details = catalog.details("URY").await.unwrap();
        assert_eq!(details.area, 176_215.0);
        assert_eq!(details.map_image_ref, "maps/URY/URY.png");
    }

    #[tokio::test]
    async fn unknown_code_is_reported() {
        let catalog = ListCatalog::new(vec![uruguay()], "{code}.png");
        assert_eq!(
            catalog.details("ARG").await,
            Err(AdapterError::UnknownCountry {
                code: "ARG".to_string()
            })
        );
    }

    #[tokio::test]
    async fn missing_land_area_without_url_is_config_error() {
        let mut rec = uruguay();
        rec.land_area = None;
        let catalog = ListCatalog::new(vec![rec], "{code}.png");
        assert!(matches!(
            catalog.details("URY").await,
            Err(AdapterError::ConfigError { .. })
        ));
    }

    #[test]
    fn land_area_parses_object_and_array_responses() {
        let obj = serde_json::json!({"area": 8515767.0});
        let arr = serde_json::json!([{"area": 2780400}]);
        assert_eq!(ListCatalog::parse_land_area(&obj).unwrap(), 8_515_767.0);
        assert_eq!(ListCatalog::parse_land_area(&arr).unwrap(), 2_780_400.0);
        assert!(ListCatalog::parse_land_area(&serde_json::json!([])).is_err());
    }

    #[test]
    fn load_reads_ordered_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(
            &path,
            r#"[{"code": "URY", "name": "Uruguay", "area": 20310},
                {"code": "BRA", "name": "Brazil", "area": 4935380}]"#,
        )
        .unwrap();
        let catalog = ListCatalog::load(&path, "{code}.png").unwrap();
        let codes: Vec<&str> = catalog.list().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["URY", "BRA"]);
    }

    #[test]
    fn load_reports_unreadable_file() {
        let result = ListCatalog::load(Path::new("/nonexistent/list.json"), "{code}.png");
        assert!(matches!(result, Err(AdapterError::ConfigError { .. })));
    }
}
