use crate::domain::error::ValidationError;
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIME_INPUT_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date and time as shown in the editable form fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateTimeParts {
    pub date: String,
    pub time: String,
}

/// Converts between stored instants and the display time zone's
/// representations: split form fields and widget instant strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeCodec {
    time_zone: Tz,
}

impl Default for DateTimeCodec {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl DateTimeCodec {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Seconds are dropped; the form only edits minutes.
    pub fn split_instant(&self, instant: DateTime<Utc>) -> DateTimeParts {
        let local = instant.with_timezone(&self.time_zone);
        DateTimeParts {
            date: local.format(DATE_FORMAT).to_string(),
            time: local.format(TIME_FORMAT).to_string(),
        }
    }

    pub fn join_parts(&self, date: &str, time: &str) -> Result<DateTime<Utc>, ValidationError> {
        self.join_parts_near(date, time, None)
    }

    /// Like [`join_parts`](Self::join_parts), but a wall time that occurs
    /// twice resolves to the occurrence closest to `reference`.
    /// `join_parts_near(split_instant(x), Some(x))` gives back `x` at minute
    /// granularity in every zone.
    pub fn join_parts_near(
        &self,
        date: &str,
        time: &str,
        reference: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, ValidationError> {
        let date = date.trim();
        let time = time.trim();
        if date.is_empty() {
            return Err(ValidationError::InvalidDateTime("date is required".to_string()));
        }
        if time.is_empty() {
            return Err(ValidationError::InvalidDateTime("time is required".to_string()));
        }

        let parsed_date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|error| {
            ValidationError::InvalidDateTime(format!("date '{date}' must be YYYY-MM-DD: {error}"))
        })?;
        let parsed_time = TIME_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(time, format).ok())
            .ok_or_else(|| ValidationError::InvalidDateTime(format!("time '{time}' must be HH:MM")))?;

        self.localize_near(parsed_date.and_time(parsed_time), reference)
    }

    /// Accepts what the widget hands out: RFC 3339 with an offset, a naive
    /// local date-time, or a bare date (local midnight).
    pub fn parse_widget_instant(&self, value: &str) -> Result<DateTime<Utc>, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::InvalidDateTime(
                "instant must not be empty".to_string(),
            ));
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Ok(parsed.with_timezone(&Utc));
        }
        if let Some(naive) = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        {
            return self.localize_near(naive, None);
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
            return self.localize_near(date.and_time(NaiveTime::MIN), None);
        }

        Err(ValidationError::InvalidDateTime(format!(
            "unrecognized instant '{value}'"
        )))
    }

    pub fn format_widget_instant(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.time_zone).to_rfc3339()
    }

    // Fold times resolve to the occurrence nearest `reference`, the earlier
    // one without it; gap times do not exist.
    fn localize_near(
        &self,
        naive: NaiveDateTime,
        reference: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, ValidationError> {
        match self.time_zone.from_local_datetime(&naive) {
            LocalResult::Single(value) => Ok(value.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                let earliest = earliest.with_timezone(&Utc);
                let latest = latest.with_timezone(&Utc);
                let distance = |candidate: DateTime<Utc>, target: DateTime<Utc>| {
                    (candidate - target).num_seconds().abs()
                };
                Ok(match reference {
                    Some(target) if distance(latest, target) < distance(earliest, target) => latest,
                    _ => earliest,
                })
            }
            LocalResult::None => Err(ValidationError::InvalidDateTime(format!(
                "{naive} does not exist in {}",
                self.time_zone
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn seoul() -> DateTimeCodec {
        DateTimeCodec::new(chrono_tz::Asia::Seoul)
    }

    #[test]
    fn split_uses_display_time_zone() {
        let parts = seoul().split_instant(fixed_time("2024-06-09T23:30:45Z"));
        assert_eq!(parts.date, "2024-06-10");
        assert_eq!(parts.time, "08:30");
    }

    #[test]
    fn join_accepts_seconds_and_fractions() {
        let codec = DateTimeCodec::default();
        let expected = fixed_time("2024-06-10T09:00:00Z");
        assert_eq!(codec.join_parts("2024-06-10", "09:00").expect("join"), expected);
        assert_eq!(codec.join_parts("2024-06-10", "09:00:00").expect("join"), expected);
        assert_eq!(codec.join_parts("2024-06-10", "09:00:00.000").expect("join"), expected);
    }

    #[test]
    fn join_rejects_missing_or_malformed_parts() {
        let codec = DateTimeCodec::default();
        assert!(matches!(
            codec.join_parts("", "09:00"),
            Err(ValidationError::InvalidDateTime(_))
        ));
        assert!(matches!(
            codec.join_parts("2024-06-10", "  "),
            Err(ValidationError::InvalidDateTime(_))
        ));
        assert!(matches!(
            codec.join_parts("10/06/2024", "09:00"),
            Err(ValidationError::InvalidDateTime(_))
        ));
        assert!(matches!(
            codec.join_parts("2024-06-10", "25:00"),
            Err(ValidationError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn join_rejects_nonexistent_local_time() {
        let codec = DateTimeCodec::new(chrono_tz::America::New_York);
        assert!(matches!(
            codec.join_parts("2024-03-10", "02:30"),
            Err(ValidationError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn join_resolves_ambiguous_local_time_to_earliest() {
        let codec = DateTimeCodec::new(chrono_tz::America::New_York);
        let joined = codec.join_parts("2024-11-03", "01:30").expect("join");
        assert_eq!(joined, fixed_time("2024-11-03T05:30:00Z"));
    }

    #[test]
    fn join_near_reference_keeps_second_occurrence_of_repeated_hour() {
        let codec = DateTimeCodec::new(chrono_tz::America::New_York);
        let second_pass = fixed_time("2024-11-03T06:30:00Z");
        let parts = codec.split_instant(second_pass);
        assert_eq!((parts.date.as_str(), parts.time.as_str()), ("2024-11-03", "01:30"));

        assert_eq!(
            codec
                .join_parts_near(&parts.date, &parts.time, Some(second_pass))
                .expect("join"),
            second_pass
        );
        assert_eq!(
            codec
                .join_parts_near("2024-11-03", "01:45", Some(second_pass))
                .expect("join"),
            fixed_time("2024-11-03T06:45:00Z")
        );
        assert_eq!(
            codec
                .join_parts_near("2024-11-03", "01:30", Some(fixed_time("2024-11-03T05:00:00Z")))
                .expect("join"),
            fixed_time("2024-11-03T05:30:00Z")
        );
    }

    #[test]
    fn parse_widget_instant_handles_widget_formats() {
        let codec = seoul();
        assert_eq!(
            codec.parse_widget_instant("2024-06-10T09:00:00+09:00").expect("offset"),
            fixed_time("2024-06-10T00:00:00Z")
        );
        assert_eq!(
            codec.parse_widget_instant("2024-06-10T00:00:00Z").expect("zulu"),
            fixed_time("2024-06-10T00:00:00Z")
        );
        assert_eq!(
            codec.parse_widget_instant("2024-06-10T09:00:00").expect("naive"),
            fixed_time("2024-06-10T00:00:00Z")
        );
        assert_eq!(
            codec.parse_widget_instant("2024-06-10T09:00").expect("naive minutes"),
            fixed_time("2024-06-10T00:00:00Z")
        );
        assert_eq!(
            codec.parse_widget_instant("2024-06-10").expect("date only"),
            fixed_time("2024-06-09T15:00:00Z")
        );
    }

    #[test]
    fn parse_widget_instant_rejects_garbage() {
        let codec = DateTimeCodec::default();
        assert!(codec.parse_widget_instant("").is_err());
        assert!(codec.parse_widget_instant("next tuesday").is_err());
    }

    #[test]
    fn format_widget_instant_is_lossless() {
        let codec = seoul();
        let instant = fixed_time("2024-06-10T00:00:12.345Z");
        let formatted = codec.format_widget_instant(instant);
        assert_eq!(formatted, "2024-06-10T09:00:12.345+09:00");
        assert_eq!(codec.parse_widget_instant(&formatted).expect("parse"), instant);
    }

    proptest! {
        #[test]
        fn split_then_join_roundtrips_at_minute_granularity(
            minutes in 15_778_080i64..68_374_080i64,
            zone_index in 0usize..4
        ) {
            let zones = [
                Tz::UTC,
                chrono_tz::Asia::Seoul,
                chrono_tz::Asia::Kolkata,
                chrono_tz::America::New_York,
            ];
            let codec = DateTimeCodec::new(zones[zone_index]);
            let instant = Utc.timestamp_opt(minutes * 60, 0).single().expect("valid instant");

            let parts = codec.split_instant(instant);
            let joined = codec
                .join_parts_near(&parts.date, &parts.time, Some(instant))
                .expect("join");
            prop_assert_eq!(joined, instant);
        }

        #[test]
        fn fall_back_hour_roundtrips_in_both_occurrences(offset_minutes in 0i64..120i64) {
            let codec = DateTimeCodec::new(chrono_tz::America::New_York);
            // 05:00Z to 07:00Z on 2024-11-03 covers both passes through 01:00-02:00 local.
            let instant = fixed_time("2024-11-03T05:00:00Z") + chrono::Duration::minutes(offset_minutes);

            let parts = codec.split_instant(instant);
            let joined = codec
                .join_parts_near(&parts.date, &parts.time, Some(instant))
                .expect("join");
            prop_assert_eq!(joined, instant);
        }
    }
}
