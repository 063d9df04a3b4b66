//! Validation and wire conversion for event start/end values.
//!
//! Everything here is pure. Time zone and timestamp format travel in an
//! explicit [`TemporalSettings`] value so concurrent callers never share
//! hidden state.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use gcal_core::config::{check_timestamp_format, CalendarConfig, DEFAULT_TIMESTAMP_FORMAT};

use crate::error::{CalendarError, DateViolation, Endpoint};
use crate::types::{Event, EventDateTime, EventTimeSlot, WireEventDateTime};

/// Layout of all-day dates on the wire.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-client conversion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalSettings {
    time_zone: Tz,
    timestamp_format: String,
}

impl TemporalSettings {
    /// Fails when the zone is not a known IANA id or the format does not
    /// render RFC 3339.
    pub fn new(
        time_zone: &str,
        timestamp_format: impl Into<String>,
    ) -> Result<Self, CalendarError> {
        let time_zone: Tz = time_zone
            .parse()
            .map_err(|_| CalendarError::InvalidTimeZone(time_zone.to_string()))?;
        let timestamp_format = timestamp_format.into();
        check_timestamp_format(&timestamp_format).map_err(CalendarError::InvalidTimestampFormat)?;

        Ok(Self {
            time_zone,
            timestamp_format,
        })
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        Self::new(&config.time_zone, config.timestamp_format.as_str())
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// Render an instant with the configured timestamp format.
    pub fn format_instant(&self, instant: &DateTime<FixedOffset>) -> String {
        instant.format(&self.timestamp_format).to_string()
    }
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Europe::Amsterdam,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Every date rule an event breaks, across both endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateValidation {
    pub violations: Vec<DateViolation>,
}

impl DateValidation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), CalendarError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CalendarError::ValidationFailed(self.violations))
        }
    }
}

/// Check that start and end each carry exactly one of date / date-time.
/// Does not stop at the first problem.
pub fn validate(event: &Event) -> DateValidation {
    let mut validation = DateValidation::default();
    for (endpoint, slot) in [(Endpoint::Start, &event.start), (Endpoint::End, &event.end)] {
        check_slot(endpoint, slot, &mut validation.violations);
    }
    validation
}

fn check_slot(endpoint: Endpoint, slot: &EventTimeSlot, violations: &mut Vec<DateViolation>) {
    if slot.date.is_some() && slot.date_time.is_some() {
        violations.push(DateViolation::BothDatesSet(endpoint));
    }
    if slot.date.is_none() && slot.date_time.is_none() {
        violations.push(DateViolation::NoDateSet(endpoint));
    }
}

/// Validate, then hand back the resolved start and end.
pub fn resolve_endpoints(event: &Event) -> Result<(EventDateTime, EventDateTime), CalendarError> {
    validate(event).into_result()?;

    let start = event
        .start
        .resolve(Endpoint::Start)
        .map_err(|v| CalendarError::ValidationFailed(vec![v]))?;
    let end = event
        .end
        .resolve(Endpoint::End)
        .map_err(|v| CalendarError::ValidationFailed(vec![v]))?;
    Ok((start, end))
}

/// Years a wire date or timestamp can carry.
pub const WIRE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Reject values whose year, as rendered, falls outside [`WIRE_YEARS`].
pub fn check_wire_range(endpoint: Endpoint, value: &EventDateTime) -> Result<(), CalendarError> {
    let year = match value {
        EventDateTime::Date(date) => date.year(),
        EventDateTime::DateTime(instant) => instant.year(),
    };
    if WIRE_YEARS.contains(&year) {
        Ok(())
    } else {
        Err(CalendarError::OutOfWireRange { endpoint, year })
    }
}

/// Wire form of a resolved endpoint. The configured zone is attached to both
/// all-day dates and precise instants.
pub fn to_wire(value: &EventDateTime, settings: &TemporalSettings) -> WireEventDateTime {
    let time_zone = Some(settings.time_zone.name().to_string());
    match value {
        EventDateTime::DateTime(instant) => WireEventDateTime {
            date: None,
            date_time: Some(settings.format_instant(instant)),
            time_zone,
        },
        EventDateTime::Date(date) => WireEventDateTime {
            date: Some(date.format(WIRE_DATE_FORMAT).to_string()),
            date_time: None,
            time_zone,
        },
    }
}

/// Inverse of [`to_wire`]. A non-empty `date` wins; otherwise `dateTime`
/// must hold an RFC 3339 timestamp.
pub fn from_wire(wire: &WireEventDateTime) -> Result<EventDateTime, CalendarError> {
    if let Some(date) = non_empty(wire.date.as_deref()) {
        return NaiveDate::parse_from_str(date, WIRE_DATE_FORMAT)
            .map(EventDateTime::Date)
            .map_err(|e| CalendarError::MalformedDate {
                value: date.to_string(),
                reason: e.to_string(),
            });
    }

    match non_empty(wire.date_time.as_deref()) {
        Some(timestamp) => DateTime::parse_from_rfc3339(timestamp)
            .map(EventDateTime::DateTime)
            .map_err(|e| CalendarError::MalformedTimestamp {
                value: timestamp.to_string(),
                reason: e.to_string(),
            }),
        None => Err(CalendarError::MalformedTimestamp {
            value: String::new(),
            reason: "record carries neither a date nor a date-time".to_string(),
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
