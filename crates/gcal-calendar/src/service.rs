//! The calendar service seam event operations are written against.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::types::WireEvent;

/// Remote calendar capability: takes wire-ready payloads, returns ids or raw
/// records. Implementations own transport, auth, timeouts and retries.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Insert an event and return the id the service assigned.
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &WireEvent,
    ) -> Result<String, ServiceError>;

    /// Events at or after `time_min`, in the service's own order.
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
    ) -> Result<Vec<WireEvent>, ServiceError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError>;
}

#[async_trait]
impl<S: CalendarService + ?Sized> CalendarService for Arc<S> {
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &WireEvent,
    ) -> Result<String, ServiceError> {
        (**self).create_event(calendar_id, event).await
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
    ) -> Result<Vec<WireEvent>, ServiceError> {
        (**self).list_events(calendar_id, time_min).await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError> {
        (**self).delete_event(calendar_id, event_id).await
    }
}
