//! Published message templates.

use deforest_core::{format_area, format_date};
use time::Date;

/// Message for a period that leaves the current country with forest left.
pub fn ongoing(
    new_km2: f64,
    date: Date,
    total_km2: f64,
    remaining_km2: f64,
    country: &str,
) -> String {
    format!(
        "{} deforestated globally on {}. {} in total. {} remaining in #{}. #deforestation",
        format_area(new_km2),
        format_date(date),
        format_area(total_km2),
        format_area(remaining_km2),
        country
    )
}

/// Message for the period that exhausts the current country.
pub fn depleted(total_km2: f64, country: &str, countries_remaining: usize) -> String {
    format!(
        "{} deforestated, #{} has been deforestated. {} countries remaining. #deforestation",
        format_area(total_km2),
        country,
        countries_remaining
    )
}
