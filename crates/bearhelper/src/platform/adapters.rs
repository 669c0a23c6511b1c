use std::sync::Arc;

use crate::error::{HelperError, HelperResult};

/// Host services used to reach Bear: opening URLs and locating the app.
pub trait Platform: Send + Sync {
    fn id(&self) -> &str {
        "unsupported"
    }

    /// Hands `url` to whichever application owns its scheme.
    fn open_url(&self, _url: &str) -> HelperResult<()> {
        Err(HelperError::NotImplemented)
    }

    fn is_bear_installed(&self) -> bool {
        false
    }

    /// Registers or unregisters the helper as a login item.
    fn set_launch_at_login(&self, _enabled: bool) -> HelperResult<()> {
        Err(HelperError::NotImplemented)
    }
}

pub type SharedPlatform = Arc<dyn Platform>;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(any(not(target_os = "macos"), test))]
pub mod portable;
pub mod recording;
