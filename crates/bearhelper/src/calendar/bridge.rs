use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use crate::dates::{shift_days, DateFormat};
use crate::utils::time::now_local;

use super::store::SharedCalendarStore;
use super::types::CalendarEvent;

/// Shown when calendars are selected but the day has no events.
pub const NO_EVENTS_MESSAGE: &str = "No events scheduled for this day.";

/// What the bridge found for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsBlock {
    /// No selected calendar is visible to the store. Nothing was fetched.
    NoCalendarsSelected,
    /// The day could not be queried (bad date, no access, store failure).
    Unavailable,
    NoEvents,
    Events(Vec<String>),
}

impl EventsBlock {
    pub fn to_text(&self) -> String {
        match self {
            EventsBlock::NoCalendarsSelected | EventsBlock::Unavailable => String::new(),
            EventsBlock::NoEvents => NO_EVENTS_MESSAGE.to_string(),
            EventsBlock::Events(lines) => lines.join("\n"),
        }
    }
}

/// Renders a day of calendar events as a checklist block.
#[derive(Clone)]
pub struct CalendarBridge {
    store: SharedCalendarStore,
}

impl CalendarBridge {
    pub fn new(store: SharedCalendarStore) -> Self {
        Self { store }
    }

    pub async fn render(
        &self,
        date: &str,
        format: &DateFormat,
        selected: &HashSet<String>,
    ) -> String {
        self.events_block(date, format, selected, now_local())
            .await
            .to_text()
    }

    pub async fn events_block(
        &self,
        date: &str,
        format: &DateFormat,
        selected: &HashSet<String>,
        now: DateTime<Local>,
    ) -> EventsBlock {
        if selected.is_empty() {
            tracing::debug!("no calendars selected; skipping event fetch for {date}");
            return EventsBlock::NoCalendarsSelected;
        }

        let day = match format.parse(date) {
            Ok(day) => day,
            Err(error) => {
                tracing::warn!("cannot resolve calendar day: {error}");
                return EventsBlock::Unavailable;
            }
        };

        let calendars = match self.store.calendars().await {
            Ok(calendars) => calendars,
            Err(error) => {
                tracing::warn!("calendar listing failed: {error}");
                return EventsBlock::Unavailable;
            }
        };
        let calendar_ids: Vec<String> = calendars
            .into_iter()
            .filter(|calendar| selected.contains(&calendar.id))
            .map(|calendar| calendar.id)
            .collect();
        if calendar_ids.is_empty() {
            tracing::warn!("none of the selected calendars are visible");
            return EventsBlock::NoCalendarsSelected;
        }

        let Some((start, end)) = day_window(day) else {
            tracing::warn!("no local day window for {day}");
            return EventsBlock::Unavailable;
        };

        let events = match self.store.events(start, end, &calendar_ids).await {
            Ok(events) => events,
            Err(error) => {
                tracing::warn!("calendar event fetch failed: {error}");
                return EventsBlock::Unavailable;
            }
        };
        tracing::debug!("found {} events for {date}", events.len());

        if events.is_empty() {
            return EventsBlock::NoEvents;
        }
        EventsBlock::Events(
            events
                .iter()
                .map(|event| format_event_line(event, now))
                .collect(),
        )
    }
}

/// `[start of day, start of next day)` in local time.
pub fn day_window(day: NaiveDate) -> Option<(DateTime<Local>, DateTime<Local>)> {
    let next = shift_days(day, 1)?;
    Some((local_midnight(day)?, local_midnight(next)?))
}

fn local_midnight(day: NaiveDate) -> Option<DateTime<Local>> {
    let midnight = day.and_time(NaiveTime::MIN);
    Local.from_local_datetime(&midnight).earliest().or_else(|| {
        // Midnight skipped by a DST transition; the day starts an hour later.
        let later = midnight + chrono::Duration::hours(1);
        Local.from_local_datetime(&later).earliest()
    })
}

/// `- [x] 09:00 - 09:30: Title`, checked once the event has ended.
pub fn format_event_line(event: &CalendarEvent, now: DateTime<Local>) -> String {
    let status = if event.end < now { 'x' } else { ' ' };
    let title = event.title.replace(['\r', '\n'], " ");
    format!(
        "- [{status}] {} - {}: {title}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M")
    )
}
