//! Google Calendar API client.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use gcal_core::{CalendarConfig, ReqwestErrorExt};
use tracing::instrument;

use crate::catalog::EventCatalog;
use crate::error::{CalendarError, ServiceError};
use crate::resolver::TemporalSettings;
use crate::service::CalendarService;
use crate::types::*;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Reminder every calendar gets when its details are patched.
const DEFAULT_REMINDER_METHOD: &str = "popup";
const DEFAULT_REMINDER_MINUTES: u32 = 90;

pub struct GoogleCalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, CALENDAR_API_BASE)
    }

    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &CalendarConfig, access_token: &str) -> Self {
        Self::with_base_url(access_token, &config.api_base_url)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn calendar_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}", self.base_url, urlencoding::encode(calendar_id))
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/events", self.calendar_url(calendar_id))
    }

    /// Create a calendar and return its id.
    #[instrument(skip(self), level = "info")]
    pub async fn insert_calendar(&self, summary: &str) -> Result<String, ServiceError> {
        let url = format!("{}/calendars", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "summary": summary }))
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let calendar: ApiCalendar = self.handle_response(response).await?;
        Ok(calendar.id)
    }

    /// Summary (title) of a calendar.
    #[instrument(skip(self), level = "info")]
    pub async fn get_calendar(&self, calendar_id: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.calendar_url(calendar_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let calendar: ApiCalendar = self.handle_response(response).await?;
        Ok(calendar.summary.unwrap_or_default())
    }

    /// Update description and location of a calendar list entry and reset
    /// its default reminders to a single popup 90 minutes ahead. The
    /// summary in `details` is not applied. Returns the entry's summary.
    #[instrument(skip(self, details), level = "info")]
    pub async fn patch_calendar(
        &self,
        calendar_id: &str,
        details: &CalendarDetails,
    ) -> Result<String, ServiceError> {
        let url = format!(
            "{}/users/me/calendarList/{}",
            self.base_url,
            urlencoding::encode(calendar_id),
        );

        let body = CalendarListPatch {
            id: calendar_id.to_string(),
            description: details.description.clone(),
            location: details.location.clone(),
            default_reminders: vec![ApiReminder {
                method: DEFAULT_REMINDER_METHOD.to_string(),
                minutes: DEFAULT_REMINDER_MINUTES,
            }],
        };

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let calendar: ApiCalendar = self.handle_response(response).await?;
        Ok(calendar.summary.unwrap_or_default())
    }

    #[instrument(skip(self), level = "info")]
    pub async fn delete_calendar(&self, calendar_id: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.calendar_url(calendar_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        self.handle_empty_response(response).await
    }

    /// List all calendars on the user's calendar list.
    #[instrument(skip(self), level = "info")]
    pub async fn list_calendars(&self) -> Result<Vec<CalendarSummary>, ServiceError> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header());
            if let Some(pt) = &page_token {
                request = request.query(&[("pageToken", pt.as_str())]);
            }

            let response = request.send().await.map_err(|e| e.into_network_error())?;
            let page: CalendarListResponse = self.handle_response(response).await?;
            calendars.extend(page.items.into_iter().map(CalendarSummary::from));

            match next_page(&mut seen_tokens, page.next_page_token) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(calendars)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let response = self.check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::ApiError(format!("JSON parse error: {}", e)))
    }

    /// Deletes answer 204 with no body.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ServiceError> {
        self.check_status(response).await?;
        Ok(())
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 401 {
            Err(ServiceError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(ServiceError::AuthRequired)
        } else if status.as_u16() == 404 || status.as_u16() == 410 {
            let text = response.text().await.unwrap_or_default();
            Err(ServiceError::NotFound(text))
        } else if status.as_u16() == 409 || status.as_u16() == 412 {
            Err(ServiceError::Conflict)
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(ServiceError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ServiceError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    #[instrument(skip(self, event), level = "info")]
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &WireEvent,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.events_url(calendar_id))
            .header("Authorization", self.auth_header())
            .json(event)
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let created: WireEvent = self.handle_response(response).await?;
        created
            .id
            .ok_or_else(|| ServiceError::ApiError("created event has no id".to_string()))
    }

    /// Follows `nextPageToken` and returns all pages concatenated in order.
    #[instrument(skip(self), level = "info")]
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
    ) -> Result<Vec<WireEvent>, ServiceError> {
        let url = self.events_url(calendar_id);
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .query(&[("timeMin", time_min)]);
            if let Some(pt) = &page_token {
                request = request.query(&[("pageToken", pt.as_str())]);
            }

            let response = request.send().await.map_err(|e| e.into_network_error())?;
            let page: EventListResponse = self.handle_response(response).await?;
            events.extend(page.items);

            match next_page(&mut seen_tokens, page.next_page_token) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!("Fetched {} raw events", events.len());
        Ok(events)
    }

    #[instrument(skip(self), level = "info")]
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError> {
        let url = format!("{}/{}", self.events_url(calendar_id), urlencoding::encode(event_id));

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        self.handle_empty_response(response).await
    }
}

/// Next page to request. A token the server already handed out ends the
/// listing instead of looping on it.
fn next_page(seen: &mut HashSet<String>, next: Option<String>) -> Option<String> {
    let next = next?;
    if seen.insert(next.clone()) {
        Some(next)
    } else {
        tracing::warn!("Server repeated page token {:?}, stopping pagination", next);
        None
    }
}

/// Event and calendar operations sharing one HTTP client.
pub struct GoogleCalendar {
    pub events: EventCatalog<Arc<GoogleCalendarClient>>,
    pub calendars: Arc<GoogleCalendarClient>,
}

impl GoogleCalendar {
    pub fn new(client: GoogleCalendarClient, settings: TemporalSettings) -> Self {
        let calendars = Arc::new(client);
        Self {
            events: EventCatalog::new(Arc::clone(&calendars), settings),
            calendars,
        }
    }

    /// Fails when the configured time zone or timestamp format is unusable.
    pub fn from_config(config: &CalendarConfig, access_token: &str) -> Result<Self, CalendarError> {
        let settings = TemporalSettings::from_config(config)?;
        Ok(Self::new(
            GoogleCalendarClient::from_config(config, access_token),
            settings,
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_facade_from_config() {
        let mut config = CalendarConfig::default();
        config.time_zone = "Asia/Tokyo".into();
        let gcal = GoogleCalendar::from_config(&config, "token").unwrap();
        assert_eq!(gcal.events.settings().time_zone(), chrono_tz::Asia::Tokyo);

        config.time_zone = "Not/AZone".into();
        assert!(matches!(
            GoogleCalendar::from_config(&config, "token"),
            Err(CalendarError::InvalidTimeZone(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_calendar() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendars"))
            .and(header("Authorization", "Bearer test_token"))
            .and(body_partial_json(serde_json::json!({"summary": "Test Calendar"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc@group.calendar.google.com",
                "summary": "Test Calendar"
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("test_token", &mock_server.uri());
        let id = client.insert_calendar("Test Calendar").await.unwrap();

        assert_eq!(id, "abc@group.calendar.google.com");
    }

    #[tokio::test]
    async fn test_get_calendar_encodes_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/abc%40group.calendar.google.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc@group.calendar.google.com",
                "summary": "Test Calendar"
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("test_token", &mock_server.uri());
        let summary = client
            .get_calendar("abc@group.calendar.google.com")
            .await
            .unwrap();

        assert_eq!(summary, "Test Calendar");
    }

    #[tokio::test]
    async fn test_patch_calendar_sends_default_reminder() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/users/me/calendarList/work"))
            .and(body_partial_json(serde_json::json!({
                "description": "Test description",
                "location": "Unknown location",
                "defaultReminders": [{"method": "popup", "minutes": 90}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "work",
                "summary": "Test Calendar"
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("test_token", &mock_server.uri());
        let details = CalendarDetails {
            summary: "Test Calendar Override".into(),
            description: "Test description".into(),
            location: "Unknown location".into(),
        };
        let summary = client.patch_calendar("work", &details).await.unwrap();

        assert_eq!(summary, "Test Calendar");
    }

    #[tokio::test]
    async fn test_list_calendars_follows_pages() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "cal2", "summary": "Work"}]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "primary", "summary": "Me", "description": "Personal"}],
                "nextPageToken": "p2"
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("test_token", &mock_server.uri());
        let calendars = client.list_calendars().await.unwrap();

        assert_eq!(calendars.len(), 2);
        assert_eq!(calendars[0].id, "primary");
        assert_eq!(calendars[0].description, "Personal");
        assert_eq!(calendars[1].summary, "Work");
    }

    #[tokio::test]
    async fn test_delete_calendar() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/calendars/work"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("test_token", &mock_server.uri());
        assert!(client.delete_calendar("work").await.is_ok());
    }

    #[tokio::test]
    async fn test_token_expired() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("expired_token", &mock_server.uri());
        let result = client.list_calendars().await;

        assert!(matches!(result, Err(ServiceError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("token", &mock_server.uri());
        let result = client.list_events("primary", "2024-01-01T00:00:00+00:00").await;

        assert!(matches!(result, Err(ServiceError::RateLimited(30))));
    }

    #[tokio::test]
    async fn test_delete_missing_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/calendars/primary/events/gone"))
            .respond_with(ResponseTemplate::new(410).set_body_string("Resource has been deleted"))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("token", &mock_server.uri());
        let result = client.delete_event("primary", "gone").await;

        assert!(matches!(
            result,
            Err(ServiceError::NotFound(ref body)) if body.contains("deleted")
        ));
    }

    #[tokio::test]
    async fn test_list_events_stops_on_repeated_page_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "same",
                    "start": {"date": "2024-06-01"},
                    "end": {"date": "2024-06-02"}
                }],
                "nextPageToken": "stuck"
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("token", &mock_server.uri());
        let events = client
            .list_events("primary", "2024-01-01T00:00:00+00:00")
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_next_page_rejects_seen_token() {
        let mut seen = HashSet::new();
        assert_eq!(next_page(&mut seen, Some("a".into())).as_deref(), Some("a"));
        assert_eq!(next_page(&mut seen, Some("b".into())).as_deref(), Some("b"));
        assert_eq!(next_page(&mut seen, Some("a".into())), None);
        assert_eq!(next_page(&mut seen, None), None);
    }

    #[tokio::test]
    async fn test_create_event_without_id_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "No id"
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::with_base_url("token", &mock_server.uri());
        let result = client.create_event("primary", &WireEvent::default()).await;

        assert!(matches!(result, Err(ServiceError::ApiError(_))));
    }
}
