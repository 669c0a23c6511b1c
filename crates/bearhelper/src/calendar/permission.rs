use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::HelperResult;

use super::store::SharedCalendarStore;
use super::types::CalendarAuthorization;

pub const AUTHORIZATION_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Requests access when undetermined. Returns whether events are readable.
pub async fn ensure_access(store: &SharedCalendarStore) -> HelperResult<bool> {
    match store.authorization().await {
        CalendarAuthorization::Authorized => Ok(true),
        CalendarAuthorization::NotDetermined => {
            let granted = store.request_access().await?;
            tracing::info!("calendar access request answered: granted={granted}");
            Ok(granted)
        }
        status => {
            tracing::warn!("calendar access is {status:?}; events will be omitted");
            Ok(false)
        }
    }
}

/// Polls authorization every `period` and calls `on_granted` once access appears.
///
/// The task ends after the callback runs. Abort the handle to stop watching early.
pub fn watch_authorization<F>(
    store: SharedCalendarStore,
    period: Duration,
    on_granted: F,
) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if store.authorization().await.is_authorized() {
                tracing::info!("calendar access granted");
                on_granted();
                return;
            }
        }
    })
}
