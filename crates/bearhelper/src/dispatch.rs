use crate::bear::NoteAction;
use crate::platform::SharedPlatform;

/// Sends note actions to Bear. Delivery is fire-and-forget: the outcome only
/// shows up later as an inbound callback, so failures are logged and dropped.
#[derive(Clone)]
pub struct NoteDispatcher {
    platform: SharedPlatform,
}

impl NoteDispatcher {
    pub fn new(platform: SharedPlatform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &SharedPlatform {
        &self.platform
    }

    pub fn dispatch(&self, action: &NoteAction) {
        let url = action.to_url();
        tracing::debug!("dispatching bear {} ({} bytes)", action.verb(), url.len());
        if let Err(error) = self.platform.open_url(&url) {
            tracing::warn!("bear {} was not delivered: {error}", action.verb());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::platform::RecordingPlatform;

    #[test]
    fn dispatch_opens_the_action_url() {
        let platform = Arc::new(RecordingPlatform::new());
        let dispatcher = NoteDispatcher::new(platform.clone());
        let action = NoteAction::open_by_id("N1").in_background();
        dispatcher.dispatch(&action);
        assert_eq!(platform.opened(), vec![action.to_url()]);
    }

    #[test]
    fn delivery_failures_are_swallowed() {
        let platform = Arc::new(RecordingPlatform::failing());
        let dispatcher = NoteDispatcher::new(platform.clone());
        dispatcher.dispatch(&NoteAction::create("text"));
        assert_eq!(platform.opened().len(), 1);
    }
}
