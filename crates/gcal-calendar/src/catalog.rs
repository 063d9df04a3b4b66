//! Event create/list/delete on top of a [`CalendarService`].

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tracing::instrument;

use crate::error::{CalendarError, Endpoint};
use crate::resolver::{self, TemporalSettings};
use crate::service::CalendarService;
use crate::types::{Event, EventStatus, EventTimeSlot, WireEvent, WireEventDateTime};

/// Validates and converts events on the way out, rebuilds them on the way in.
pub struct EventCatalog<S> {
    service: S,
    settings: TemporalSettings,
}

impl<S: CalendarService> EventCatalog<S> {
    pub fn new(service: S, settings: TemporalSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &TemporalSettings {
        &self.settings
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Payload `create` would send, without sending it.
    pub fn build_payload(&self, event: &Event) -> Result<WireEvent, CalendarError> {
        let (start, end) = resolver::resolve_endpoints(event)?;
        resolver::check_wire_range(Endpoint::Start, &start)?;
        resolver::check_wire_range(Endpoint::End, &end)?;

        Ok(WireEvent {
            id: None,
            summary: Some(event.summary.clone()),
            description: Some(event.description.clone()),
            location: Some(event.location.clone()),
            start: Some(resolver::to_wire(&start, &self.settings)),
            end: Some(resolver::to_wire(&end, &self.settings)),
            status: Some(EventStatus::Confirmed.as_str().to_string()),
        })
    }

    /// Create an event and return the id the service assigned. Invalid
    /// dates are rejected before the service is contacted.
    #[instrument(skip(self, event), fields(summary = %event.summary), level = "info")]
    pub async fn create(&self, calendar_id: &str, event: &Event) -> Result<String, CalendarError> {
        let payload = match self.build_payload(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Rejected event before sending: {}", e);
                return Err(e);
            }
        };

        let id = self.service.create_event(calendar_id, &payload).await?;
        tracing::info!(event_id = %id, "Event created");
        Ok(id)
    }

    /// Events starting at or after `lower_bound`, in service order. One
    /// unreadable record fails the whole listing.
    #[instrument(skip(self), level = "info")]
    pub async fn list_since(
        &self,
        calendar_id: &str,
        lower_bound: DateTime<FixedOffset>,
    ) -> Result<Vec<Event>, CalendarError> {
        let time_min = self.settings.format_instant(&lower_bound);
        let records = self.service.list_events(calendar_id, &time_min).await?;
        let count = records.len();

        let events = records
            .into_iter()
            .map(event_from_wire)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!("Discarding listing of {} records: {}", count, e);
                e
            })?;

        tracing::debug!("Listed {} events", events.len());
        Ok(events)
    }

    /// Every event in the calendar.
    pub async fn list(&self, calendar_id: &str) -> Result<Vec<Event>, CalendarError> {
        self.list_since(calendar_id, list_all_lower_bound()).await
    }

    #[instrument(skip(self), level = "info")]
    pub async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        self.service.delete_event(calendar_id, event_id).await?;
        Ok(())
    }
}

/// Lower bound used by [`EventCatalog::list`]: 1900-01-01T00:00:00Z.
pub fn list_all_lower_bound() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .fixed_offset()
}

fn event_from_wire(record: WireEvent) -> Result<Event, CalendarError> {
    let start = slot_from_wire(record.start.as_ref(), Endpoint::Start)?;
    let end = slot_from_wire(record.end.as_ref(), Endpoint::End)?;

    let mut event = Event::from_slots(record.summary.unwrap_or_default(), start, end)
        .with_description(record.description.unwrap_or_default())
        .with_location(record.location.unwrap_or_default())
        .with_status(EventStatus::from_api(record.status.as_deref()));
    event.id = record.id;
    Ok(event)
}

fn slot_from_wire(
    wire: Option<&WireEventDateTime>,
    endpoint: Endpoint,
) -> Result<EventTimeSlot, CalendarError> {
    match wire {
        Some(wire) => resolver::from_wire(wire).map(EventTimeSlot::from),
        None => Err(CalendarError::MalformedTimestamp {
            value: String::new(),
            reason: format!("record has no {}", endpoint),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_list_all_lower_bound() {
        let settings = TemporalSettings::default();
        assert_eq!(
            settings.format_instant(&list_all_lower_bound()),
            "1900-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_event_from_wire_reads_each_endpoint() {
        let record: WireEvent = serde_json::from_value(serde_json::json!({
            "id": "evt1",
            "summary": "Offsite",
            "location": "Utrecht",
            "status": "tentative",
            "start": {"date": "2024-06-01"},
            "end": {"date": "2024-06-03"}
        }))
        .unwrap();

        let event = event_from_wire(record).unwrap();
        assert_eq!(event.id.as_deref(), Some("evt1"));
        assert_eq!(event.status(), EventStatus::Tentative);
        assert_eq!(event.location, "Utrecht");
        assert_eq!(event.description, "");
        assert_eq!(event.start.date.unwrap().to_string(), "2024-06-01");
        assert_eq!(event.end.date.unwrap().to_string(), "2024-06-03");
    }

    #[test]
    fn test_event_from_wire_requires_start() {
        let record = WireEvent {
            id: Some("evt2".into()),
            end: Some(WireEventDateTime {
                date: Some("2024-06-03".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = event_from_wire(record).unwrap_err();
        assert!(matches!(
            err,
            CalendarError::MalformedTimestamp { ref reason, .. } if reason.contains("start")
        ));
    }
}
