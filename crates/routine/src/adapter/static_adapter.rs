//! Static measurement adapter: reports a configured area for every period.
//!
//! Used for dry runs and for exercising the routine without network access.

use std::time::Duration;

use async_trait::async_trait;

use super::{AdapterError, Measurement, MeasurementSource, Period};

/// Measurement source that always reports the same area.
pub struct StaticMeasurement {
    area_km2: f64,
}

impl StaticMeasurement {
    pub fn new(area_km2: f64) -> Self {
        StaticMeasurement { area_km2 }
    }
}

#[async_trait]
impl MeasurementSource for StaticMeasurement {
    async fn get_alerts(
        &self,
        period: &Period,
        _request_delay: Duration,
    ) -> Result<Measurement, AdapterError> {
        if !self.area_km2.is_finite() || self.area_km2 < 0.0 {
            return Err(AdapterError::ConfigError {
                message: format!("static area must be non-negative, got {}", self.area_km2),
            });
        }

        Ok(Measurement {
            area_km2: self.area_km2,
            raw_log: serde_json::json!({
                "source": "static",
                "period": period.query_value(),
                "area_km2": self.area_km2,
            }),
        })
    }

    fn adapter_id(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn reports_configured_area_and_period() {
        let period = Period::lagged(datetime!(2026-10-17 00:00 UTC), 1).unwrap();
        let m = StaticMeasurement::new(30.0)
            .get_alerts(&period, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(m.area_km2, 30.0);
        assert_eq!(m.raw_log["period"], "2026-10-16,2026-10-16");
    }

    #[tokio::test]
    async fn negative_area_is_a_config_error() {
        let period = Period::lagged(datetime!(2026-10-17 00:00 UTC), 1).unwrap();
        let result = StaticMeasurement::new(-1.0)
            .get_alerts(&period, Duration::ZERO)
            .await;
        assert!(matches!(result, Err(AdapterError::ConfigError { .. })));
    }
}
