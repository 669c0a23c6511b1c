use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::RwLock;

use crate::error::{HelperError, HelperResult};

use super::types::{CalendarAuthorization, CalendarEvent, CalendarInfo};

/// Read access to the system calendar database.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    fn id(&self) -> &str {
        "unsupported"
    }

    async fn authorization(&self) -> CalendarAuthorization {
        CalendarAuthorization::Denied
    }

    /// Asks the user for access. Resolves to whether access was granted.
    async fn request_access(&self) -> HelperResult<bool> {
        Err(HelperError::NotImplemented)
    }

    async fn calendars(&self) -> HelperResult<Vec<CalendarInfo>> {
        Err(HelperError::NotImplemented)
    }

    /// Events overlapping `[start, end)` in the given calendars, in store order.
    async fn events(
        &self,
        _start: DateTime<Local>,
        _end: DateTime<Local>,
        _calendar_ids: &[String],
    ) -> HelperResult<Vec<CalendarEvent>> {
        Err(HelperError::NotImplemented)
    }
}

pub type SharedCalendarStore = Arc<dyn CalendarStore>;

pub fn default_calendar_store() -> SharedCalendarStore {
    #[cfg(target_os = "macos")]
    {
        Arc::new(super::eventkit::EventKitStore::new())
    }

    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(PortableCalendarStore)
    }
}

/// Store used where no calendar framework exists. Every query is unsupported.
#[derive(Debug, Default)]
pub struct PortableCalendarStore;

#[async_trait]
impl CalendarStore for PortableCalendarStore {
    async fn request_access(&self) -> HelperResult<bool> {
        Err(HelperError::Unsupported("calendar access".to_string()))
    }

    async fn calendars(&self) -> HelperResult<Vec<CalendarInfo>> {
        Err(HelperError::Unsupported("calendar listing".to_string()))
    }

    async fn events(
        &self,
        _start: DateTime<Local>,
        _end: DateTime<Local>,
        _calendar_ids: &[String],
    ) -> HelperResult<Vec<CalendarEvent>> {
        Err(HelperError::Unsupported("calendar events".to_string()))
    }
}

/// In-memory calendar store. Events are returned in insertion order.
#[derive(Debug)]
pub struct MemoryCalendarStore {
    state: RwLock<MemoryCalendarState>,
}

#[derive(Debug)]
struct MemoryCalendarState {
    calendars: Vec<CalendarInfo>,
    events: Vec<CalendarEvent>,
    authorization: CalendarAuthorization,
    grant_on_request: bool,
}

impl MemoryCalendarStore {
    pub fn new(calendars: Vec<CalendarInfo>, events: Vec<CalendarEvent>) -> Self {
        Self {
            state: RwLock::new(MemoryCalendarState {
                calendars,
                events,
                authorization: CalendarAuthorization::Authorized,
                grant_on_request: true,
            }),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub async fn set_authorization(&self, authorization: CalendarAuthorization) {
        self.state.write().await.authorization = authorization;
    }

    pub async fn set_grant_on_request(&self, grant: bool) {
        self.state.write().await.grant_on_request = grant;
    }
}

#[async_trait]
impl CalendarStore for MemoryCalendarStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn authorization(&self) -> CalendarAuthorization {
        self.state.read().await.authorization
    }

    async fn request_access(&self) -> HelperResult<bool> {
        let mut state = self.state.write().await;
        if state.grant_on_request {
            state.authorization = CalendarAuthorization::Authorized;
        } else if state.authorization == CalendarAuthorization::NotDetermined {
            state.authorization = CalendarAuthorization::Denied;
        }
        Ok(state.authorization.is_authorized())
    }

    async fn calendars(&self) -> HelperResult<Vec<CalendarInfo>> {
        let state = self.state.read().await;
        if !state.authorization.is_authorized() {
            return Ok(Vec::new());
        }
        Ok(state.calendars.clone())
    }

    async fn events(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
        calendar_ids: &[String],
    ) -> HelperResult<Vec<CalendarEvent>> {
        let state = self.state.read().await;
        if !state.authorization.is_authorized() {
            return Err(HelperError::InvalidInput(
                "calendar access not granted".to_string(),
            ));
        }
        Ok(state
            .events
            .iter()
            .filter(|event| calendar_ids.contains(&event.calendar_id))
            .filter(|event| event.start < end && event.end > start)
            .cloned()
            .collect())
    }
}
