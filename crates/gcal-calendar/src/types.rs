//! Calendar API types and data structures.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DateViolation, Endpoint};

/// Event time - either an all-day date or a precise instant, never both.
///
/// Only years 0000 through 9999 (as rendered in the value's own offset) can
/// be sent; `EventCatalog::create` rejects anything outside that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDateTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl EventDateTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventDateTime::Date(_))
    }
}

impl From<NaiveDate> for EventDateTime {
    fn from(date: NaiveDate) -> Self {
        EventDateTime::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for EventDateTime {
    fn from(instant: DateTime<FixedOffset>) -> Self {
        EventDateTime::DateTime(instant)
    }
}

impl From<DateTime<Utc>> for EventDateTime {
    fn from(instant: DateTime<Utc>) -> Self {
        EventDateTime::DateTime(instant.fixed_offset())
    }
}

/// Start or end of an event as two independent optional fields.
///
/// This is the shape callers fill in by hand. It is only sendable once it
/// carries exactly one of `date` / `date_time`; see [`EventTimeSlot::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTimeSlot {
    pub date: Option<NaiveDate>,
    pub date_time: Option<DateTime<FixedOffset>>,
}

impl EventTimeSlot {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
        }
    }

    pub fn at(instant: DateTime<FixedOffset>) -> Self {
        Self {
            date: None,
            date_time: Some(instant),
        }
    }

    /// Collapse into an [`EventDateTime`], reporting which rule is broken
    /// otherwise.
    pub fn resolve(&self, endpoint: Endpoint) -> Result<EventDateTime, DateViolation> {
        match (self.date, self.date_time) {
            (Some(date), None) => Ok(EventDateTime::Date(date)),
            (None, Some(instant)) => Ok(EventDateTime::DateTime(instant)),
            (Some(_), Some(_)) => Err(DateViolation::BothDatesSet(endpoint)),
            (None, None) => Err(DateViolation::NoDateSet(endpoint)),
        }
    }
}

impl From<EventDateTime> for EventTimeSlot {
    fn from(value: EventDateTime) -> Self {
        match value {
            EventDateTime::Date(date) => Self::all_day(date),
            EventDateTime::DateTime(instant) => Self::at(instant),
        }
    }
}

/// Event status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Tentative => "tentative",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Unknown or missing values read as confirmed.
    pub fn from_api(value: Option<&str>) -> Self {
        match value {
            Some("tentative") => EventStatus::Tentative,
            Some("cancelled") => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        }
    }
}

/// One calendar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Assigned by the service; `None` until the event is created.
    pub id: Option<String>,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: EventTimeSlot,
    pub end: EventTimeSlot,
    status: EventStatus,
}

impl Event {
    /// Build an event from resolved endpoints. Each endpoint carries exactly
    /// one of date / date-time.
    pub fn new(
        summary: impl Into<String>,
        start: impl Into<EventDateTime>,
        end: impl Into<EventDateTime>,
    ) -> Self {
        let start: EventDateTime = start.into();
        let end: EventDateTime = end.into();
        Self::from_slots(summary, start.into(), end.into())
    }

    /// Build an event from hand-filled slots. Nothing is checked here;
    /// `EventCatalog::create` validates the slots before sending.
    pub fn from_slots(
        summary: impl Into<String>,
        start: EventTimeSlot,
        end: EventTimeSlot,
    ) -> Self {
        Self {
            id: None,
            summary: summary.into(),
            description: String::new(),
            location: String::new(),
            start,
            end,
            status: EventStatus::Confirmed,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Events created through gcal are always confirmed; listed events report
    /// whatever the service says.
    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub(crate) fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }
}

/// Calendar metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub location: String,
}

/// Editable calendar fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDetails {
    pub summary: String,
    pub description: String,
    pub location: String,
}

// API Types

/// Wire form of a start or end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Event as sent to and returned by the Calendar API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<WireEventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<WireEventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<WireEvent>,
    pub next_page_token: Option<String>,
}

/// Calendar resource, also the shape of a calendar list entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
}

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<ApiCalendar>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiReminder {
    pub method: String,
    pub minutes: u32,
}

/// Body of a calendar list entry patch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListPatch {
    pub id: String,
    pub description: String,
    pub location: String,
    pub default_reminders: Vec<ApiReminder>,
}

impl From<ApiCalendar> for CalendarSummary {
    fn from(api: ApiCalendar) -> Self {
        Self {
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            description: api.description.unwrap_or_default(),
            location: api.location.unwrap_or_default(),
        }
    }
}
