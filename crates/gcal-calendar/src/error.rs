//! Calendar-specific error types.

use std::fmt;

use gcal_core::{AuthError, NetworkError};
use thiserror::Error;

/// Which end of an event a date problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Start => "start",
            Endpoint::End => "end",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A start or end that does not carry exactly one of date / date-time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateViolation {
    #[error("{0}: choose a date or a date-time, not both")]
    BothDatesSet(Endpoint),

    #[error("{0}: at least one of date or date-time must be present")]
    NoDateSet(Endpoint),
}

impl DateViolation {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::BothDatesSet(endpoint) | Self::NoDateSet(endpoint) => *endpoint,
        }
    }
}

fn summarize(violations: &[DateViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure reported by the calendar service collaborator.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: resource was modified")]
    Conflict,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl ServiceError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Your token lacks access to this calendar".to_string(),
            Self::TokenExpired => "Your session has expired. Provide a fresh token.".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Calendar or event not found".to_string(),
            Self::Conflict => "The item was modified elsewhere. Please refresh.".to_string(),
            Self::ApiError(msg) => format!("Calendar error: {}", msg),
            Self::Network(e) => e.user_message().to_string(),
        }
    }

    /// Whether this error should trigger a token refresh.
    pub fn should_refresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::AuthRequired)
    }

    /// The token problem behind this failure, if the service rejected the
    /// credentials.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            Self::TokenExpired => Some(AuthError::TokenExpired),
            Self::AuthRequired => Some(AuthError::InvalidToken),
            _ => None,
        }
    }

    /// Whether a caller could reasonably retry. gcal itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Network(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Errors surfaced by event operations.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Event validation failed: {}", summarize(.0))]
    ValidationFailed(Vec<DateViolation>),

    #[error("Malformed date {value:?}: {reason}")]
    MalformedDate { value: String, reason: String },

    #[error("Malformed timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("{endpoint} year {year} cannot be written as a 4-digit year")]
    OutOfWireRange { endpoint: Endpoint, year: i32 },

    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid timestamp format: {0}")]
    InvalidTimestampFormat(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ServiceError),
}

impl CalendarError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed(violations) => {
                format!("Invalid event: {}", summarize(violations))
            }
            Self::OutOfWireRange { .. } => {
                "Event dates must fall between the years 0000 and 9999".to_string()
            }
            Self::MalformedDate { .. } | Self::MalformedTimestamp { .. } => {
                "The calendar returned an event with unreadable dates".to_string()
            }
            Self::InvalidTimeZone(_) | Self::InvalidTimestampFormat(_) => {
                "Calendar settings are invalid. Check your configuration.".to_string()
            }
            Self::Upstream(e) => e.user_message(),
        }
    }

    /// Violations carried by a `ValidationFailed`, empty otherwise.
    pub fn violations(&self) -> &[DateViolation] {
        match self {
            Self::ValidationFailed(violations) => violations,
            _ => &[],
        }
    }

    /// Token problem behind an upstream rejection, if any.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            Self::Upstream(e) => e.auth_error(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_violation() {
        let err = CalendarError::ValidationFailed(vec![
            DateViolation::BothDatesSet(Endpoint::Start),
            DateViolation::NoDateSet(Endpoint::End),
        ]);
        let text = err.to_string();
        assert!(text.contains("start: choose a date"));
        assert!(text.contains("end: at least one"));
        assert_eq!(err.violations().len(), 2);
        assert!(err.user_message().starts_with("Invalid event"));
    }

    #[test]
    fn test_violation_endpoint() {
        assert_eq!(
            DateViolation::NoDateSet(Endpoint::End).endpoint(),
            Endpoint::End
        );
        assert_eq!(Endpoint::Start.to_string(), "start");
    }

    #[test]
    fn test_should_refresh_token() {
        assert!(ServiceError::TokenExpired.should_refresh_token());
        assert!(ServiceError::AuthRequired.should_refresh_token());
        assert!(!ServiceError::NotFound("x".into()).should_refresh_token());
    }

    #[test]
    fn test_rejected_token_maps_to_auth_error() {
        assert!(matches!(
            ServiceError::TokenExpired.auth_error(),
            Some(AuthError::TokenExpired)
        ));
        assert!(matches!(
            CalendarError::from(ServiceError::AuthRequired).auth_error(),
            Some(AuthError::InvalidToken)
        ));
        assert!(ServiceError::Conflict.auth_error().is_none());
        assert!(CalendarError::ValidationFailed(vec![]).auth_error().is_none());
    }

    #[test]
    fn test_is_retryable() {
        assert!(ServiceError::RateLimited(10).is_retryable());
        assert!(ServiceError::Network(NetworkError::Timeout).is_retryable());
        assert!(!ServiceError::NotFound("x".into()).is_retryable());
        assert!(!ServiceError::Conflict.is_retryable());
    }

    #[test]
    fn test_upstream_keeps_cause() {
        let err = CalendarError::from(ServiceError::RateLimited(30));
        assert!(err.to_string().contains("30"));
        assert!(err.user_message().contains("30"));
        assert!(err.violations().is_empty());
    }
}
