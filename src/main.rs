use anyhow::Result;
use chrono::Utc;
use gcal_calendar::{Endpoint, EventDateTime, EventTimeSlot, GoogleCalendar};
use gcal_core::{AuthError, Config};

#[tokio::main]
async fn main() -> Result<()> {
    gcal_core::init()?;

    let (config, _warnings) = Config::load_validated()?;
    let calendar_config = &config.calendar;

    let Some(token) = calendar_config.access_token.as_deref() else {
        let err = AuthError::TokenNotFound("google-calendar".to_string());
        eprintln!("{}", err.user_message());
        return Err(err.into());
    };

    let gcal = GoogleCalendar::from_config(calendar_config, token)?;
    let calendar_id = &calendar_config.default_calendar_id;

    tracing::info!("Listing upcoming events for {}", calendar_id);

    let now = Utc::now().fixed_offset();
    let events = match gcal.events.list_since(calendar_id, now).await {
        Ok(events) => events,
        Err(e) => {
            if let Some(auth) = e.auth_error() {
                eprintln!("{}", auth.user_message());
                return Err(auth.into());
            }
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    println!("Upcoming events in {} ({}):", calendar_id, events.len());
    for event in &events {
        println!("  {}  {}", describe(&event.start), event.summary);
    }

    Ok(())
}

fn describe(slot: &EventTimeSlot) -> String {
    match slot.resolve(Endpoint::Start) {
        Ok(EventDateTime::Date(date)) => format!("{} (all day)", date),
        Ok(EventDateTime::DateTime(instant)) => instant.format("%Y-%m-%d %H:%M %:z").to_string(),
        Err(_) => "?".to_string(),
    }
}
