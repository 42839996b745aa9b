//! Human-readable strings for published messages.

use time::Date;

/// Round an area to whole km² and group thousands: `1234.6` → `"1,235km²"`.
pub fn format_area(area_km2: f64) -> String {
    let rounded = area_km2.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{grouped}km²")
    } else {
        format!("{grouped}km²")
    }
}

/// Long English date: `"Saturday, October 17, 2026"`.
pub fn format_date(date: Date) -> String {
    format!(
        "{}, {} {}, {}",
        date.weekday(),
        date.month(),
        date.day(),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn areas_are_rounded_and_grouped() {
        assert_eq!(format_area(0.0), "0km²");
        assert_eq!(format_area(30.0), "30km²");
        assert_eq!(format_area(999.5), "1,000km²");
        assert_eq!(format_area(1_234_567.2), "1,234,567km²");
        assert_eq!(format_area(100_000.0), "100,000km²");
    }

    #[test]
    fn negative_areas_keep_their_sign() {
        assert_eq!(format_area(-10.0), "-10km²");
        assert_eq!(format_area(-1_500.0), "-1,500km²");
        assert_eq!(format_area(-0.2), "0km²");
    }

    #[test]
    fn dates_use_long_weekday_and_month() {
        assert_eq!(format_date(date!(2026 - 10 - 17)), "Saturday, October 17, 2026");
        assert_eq!(format_date(date!(2020 - 03 - 01)), "Sunday, March 1, 2020");
    }
}
