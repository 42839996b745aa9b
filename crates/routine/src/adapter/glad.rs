//! GLAD alert adapter: sums reported forest loss over every listed country.
//!
//! For each country code the adapter requests
//! `{base_url}/glad-alerts/admin/{code}?period={start},{end}` and reads the
//! loss from `data.attributes`: `areaHa` (hectares) when present, otherwise
//! the alert count `value`, each alert covering one 30 m × 30 m pixel.
//! Requests are spaced by the caller's request delay.

use std::time::Duration;

use async_trait::async_trait;

use super::http::get_json;
use super::{AdapterError, Measurement, MeasurementSource, Period};

/// Area of one GLAD alert pixel (30 m × 30 m), km².
pub const ALERT_PIXEL_KM2: f64 = 0.0009;

/// Measurement source backed by the GLAD alerts HTTP API.
pub struct GladSource {
    base_url: String,
    codes: Vec<String>,
    auth_token: Option<String>,
}

impl GladSource {
    /// Query `codes` (ISO alpha-3) against the API at `base_url`.
    pub fn new(base_url: &str, codes: Vec<String>, auth_token: Option<String>) -> Self {
        GladSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            codes,
            auth_token,
        }
    }

    fn url_for(&self, code: &str, period: &Period) -> String {
        format!(
            "{}/glad-alerts/admin/{}?period={}",
            self.base_url,
            code,
            period.query_value()
        )
    }

    /// Extract the reported loss, km², from one API response.
    pub fn parse_area(body: &serde_json::Value) -> Result<f64, AdapterError> {
        let attributes = &body["data"]["attributes"];

        if let Some(hectares) = attributes["areaHa"].as_f64() {
            return Ok(hectares / 100.0);
        }
        if let Some(alerts) = attributes["value"].as_f64() {
            return Ok(alerts * ALERT_PIXEL_KM2);
        }

        Err(AdapterError::InvalidResponse {
            source_id: "glad".to_string(),
            message: "expected numeric data.attributes.areaHa or data.attributes.value"
                .to_string(),
        })
    }
}

#[async_trait]
impl MeasurementSource for GladSource {
    async fn get_alerts(
        &self,
        period: &Period,
        request_delay: Duration,
    ) -> Result<Measurement, AdapterError> {
        let mut total = 0.0;
        let mut responses = Vec::with_capacity(self.codes.len());

        for (i, code) in self.codes.iter().enumerate() {
            if i > 0 && !request_delay.is_zero() {
                tokio::time::sleep(request_delay).await;
            }

            let body = get_json("glad", self.url_for(code, period), self.auth_token.clone()).await?;
            let area = Self::parse_area(&body)?;
            tracing::debug!(code = %code, area_km2 = area, "glad alerts");
            total += area;

            responses.push(serde_json::json!({
                "code": code,
                "area_km2": area,
                "response": body,
            }));
        }

        Ok(Measurement {
            area_km2: total,
            raw_log: serde_json::json!({
                "source": "glad",
                "period": period.query_value(),
                "area_km2": total,
                "responses": responses,
            }),
        })
    }

    fn adapter_id(&self) -> &str {
        "glad"
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn area_in_hectares_is_converted_to_km2() {
        let body = serde_json::json!({"data": {"attributes": {"areaHa": 250.0, "value": 9}}});
        assert_eq!(GladSource::parse_area(&body).unwrap(), 2.5);
    }

    #[test]
    fn alert_count_falls_back_to_pixel_area() {
        let body = serde_json::json!({"data": {"attributes": {"value": 10000}}});
        let area = GladSource::parse_area(&body).unwrap();
        assert!((area - 9.0).abs() < 1e-9);
    }

    #[test]
    fn missing_attributes_are_invalid() {
        let body = serde_json::json!({"errors": [{"detail": "not found"}]});
        assert!(matches!(
            GladSource::parse_area(&body),
            Err(AdapterError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn url_includes_code_and_period() {
        let source = GladSource::new("https://api.example.org/v1/", vec![], None);
        let period = Period::lagged(datetime!(2026-10-17 00:00 UTC), 7).unwrap();
        assert_eq!(
            source.url_for("BRA", &period),
            "https://api.example.org/v1/glad-alerts/admin/BRA?period=2026-10-10,2026-10-10"
        );
    }

    #[tokio::test]
    async fn no_codes_means_zero_area_without_requests() {
        let source = GladSource::new("http://127.0.0.1:9", vec![], None);
        let period = Period::lagged(datetime!(2026-10-17 00:00 UTC), 7).unwrap();
        let m = source
            .get_alerts(&period, Duration::from_millis(400))
            .await
            .unwrap();
        assert_eq!(m.area_km2, 0.0);
        assert_eq!(m.raw_log["responses"], serde_json::json!([]));
    }
}
