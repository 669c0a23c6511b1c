//! Calendar bridge: reads the system calendar and renders a day as a checklist.

pub mod bridge;
#[cfg(any(target_os = "macos", test))]
pub mod eventkit;
pub mod permission;
pub mod store;
pub mod types;

pub use bridge::{CalendarBridge, EventsBlock, NO_EVENTS_MESSAGE};
pub use permission::{ensure_access, watch_authorization, AUTHORIZATION_POLL_PERIOD};
pub use store::{
    default_calendar_store, CalendarStore, MemoryCalendarStore, PortableCalendarStore,
    SharedCalendarStore,
};
pub use types::{CalendarAuthorization, CalendarEvent, CalendarInfo};
