//! Google Calendar integration for gcal.
//!
//! Event start/end validation and wire conversion live in [`resolver`];
//! [`catalog`] runs event operations through any [`CalendarService`], and
//! [`client`] provides the HTTP implementation.

pub mod catalog;
pub mod client;
pub mod error;
pub mod resolver;
pub mod service;
pub mod types;

pub use catalog::EventCatalog;
pub use client::{GoogleCalendar, GoogleCalendarClient};
pub use error::{CalendarError, DateViolation, Endpoint, ServiceError};
pub use resolver::{from_wire, to_wire, validate, DateValidation, TemporalSettings};
pub use service::CalendarService;
pub use types::{
    CalendarDetails, CalendarSummary, Event, EventDateTime, EventStatus, EventTimeSlot,
    WireEvent, WireEventDateTime,
};
