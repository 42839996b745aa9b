use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Where the bot stands: the last processed period and the running total
/// for the country currently being deforested on the map.
///
/// Records are never edited. Progress moves forward by appending a record
/// whose `sequence` is the latest one's plus one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Position in the append-only history. The seed record is 0.
    pub sequence: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub period_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_end: OffsetDateTime,
    /// Area measured in the period, km².
    pub period_area: f64,
    /// Index into the ordered country list.
    pub country_index: usize,
    /// Deforested area attributed to the current country so far, km².
    pub accumulated_area: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl ProgressRecord {
    /// The zero record written on first use of an empty store.
    pub fn seed(now: OffsetDateTime) -> Self {
        ProgressRecord {
            sequence: 0,
            period_start: now,
            period_end: now,
            period_area: 0.0,
            country_index: 0,
            accumulated_area: 0.0,
            recorded_at: now,
        }
    }

    /// Sequence number a record appended after `latest` must carry.
    pub fn next_sequence(latest: Option<&ProgressRecord>) -> u64 {
        latest.map(|r| r.sequence + 1).unwrap_or(0)
    }

    /// Check that `self` may be appended after `latest`.
    ///
    /// Backends call this under their write lock before persisting.
    pub fn validate_successor(&self, latest: Option<&ProgressRecord>) -> Result<(), StorageError> {
        let expected = Self::next_sequence(latest);
        if self.sequence != expected {
            return Err(StorageError::ConcurrentConflict {
                expected,
                found: self.sequence,
            });
        }

        if !self.accumulated_area.is_finite() || self.accumulated_area < 0.0 {
            return Err(StorageError::InvalidRecord(format!(
                "accumulated area must be a non-negative number, got {}",
                self.accumulated_area
            )));
        }

        if !self.period_area.is_finite() || self.period_area < 0.0 {
            return Err(StorageError::InvalidRecord(format!(
                "period area must be a non-negative number, got {}",
                self.period_area
            )));
        }

        if let Some(prev) = latest {
            if self.country_index < prev.country_index {
                return Err(StorageError::InvalidRecord(format!(
                    "country index moved backwards from {} to {}",
                    prev.country_index, self.country_index
                )));
            }
        }

        Ok(())
    }
}

/// Audit entry for one call to the measurement source.
///
/// Written before anything else happens with the measurement, whether or
/// not the rest of the cycle succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFetchLog {
    #[serde(with = "time::serde::rfc3339")]
    pub period_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub period_end: OffsetDateTime,
    /// Raw payload returned by the measurement source.
    pub payload: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn at(sequence: u64, country_index: usize, accumulated_area: f64) -> ProgressRecord {
        ProgressRecord {
            sequence,
            country_index,
            accumulated_area,
            ..ProgressRecord::seed(datetime!(2026-10-10 00:00 UTC))
        }
    }

    #[test]
    fn seed_is_first_in_an_empty_history() {
        assert!(at(0, 0, 0.0).validate_successor(None).is_ok());
        assert!(matches!(
            at(1, 0, 0.0).validate_successor(None),
            Err(StorageError::ConcurrentConflict {
                expected: 0,
                found: 1
            })
        ));
    }

    #[test]
    fn stale_sequence_is_a_conflict() {
        let latest = at(4, 1, 10.0);
        assert!(matches!(
            at(4, 1, 20.0).validate_successor(Some(&latest)),
            Err(StorageError::ConcurrentConflict {
                expected: 5,
                found: 4
            })
        ));
        assert!(at(5, 1, 20.0).validate_successor(Some(&latest)).is_ok());
    }

    #[test]
    fn country_index_never_moves_backwards() {
        let latest = at(2, 3, 0.0);
        assert!(matches!(
            at(3, 2, 0.0).validate_successor(Some(&latest)),
            Err(StorageError::InvalidRecord(_))
        ));
        assert!(at(3, 4, 0.0).validate_successor(Some(&latest)).is_ok());
    }

    #[test]
    fn negative_areas_are_rejected() {
        assert!(matches!(
            at(0, 0, -1.0).validate_successor(None),
            Err(StorageError::InvalidRecord(_))
        ));
        let mut rec = at(0, 0, 0.0);
        rec.period_area = f64::NAN;
        assert!(matches!(
            rec.validate_successor(None),
            Err(StorageError::InvalidRecord(_))
        ));
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let json = serde_json::to_value(at(0, 0, 0.0)).unwrap();
        assert_eq!(json["period_start"], "2026-10-10T00:00:00Z");
        let back: ProgressRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, at(0, 0, 0.0));
    }
}
