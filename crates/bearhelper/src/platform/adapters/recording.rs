use std::sync::{Mutex, PoisonError};

use super::Platform;
use crate::error::{HelperError, HelperResult};

/// Records opened URLs instead of delivering them. Used for dry runs and tests.
#[derive(Debug)]
pub struct RecordingPlatform {
    opened: Mutex<Vec<String>>,
    launch_at_login: Mutex<Option<bool>>,
    bear_installed: bool,
    fail_opens: bool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            launch_at_login: Mutex::new(None),
            bear_installed: true,
            fail_opens: false,
        }
    }

    pub fn without_bear() -> Self {
        Self {
            bear_installed: false,
            ..Self::new()
        }
    }

    /// Every `open_url` call fails after being recorded.
    pub fn failing() -> Self {
        Self {
            fail_opens: true,
            ..Self::new()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_opened(&self) -> Option<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// The last login-item state applied, if any.
    pub fn launch_at_login(&self) -> Option<bool> {
        *self
            .launch_at_login
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns and clears the recorded URLs.
    pub fn take_opened(&self) -> Vec<String> {
        std::mem::take(&mut *self.opened.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for RecordingPlatform {
    fn id(&self) -> &str {
        "recording"
    }

    fn open_url(&self, url: &str) -> HelperResult<()> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        if self.fail_opens {
            return Err(HelperError::Internal("recording platform set to fail".to_string()));
        }
        Ok(())
    }

    fn is_bear_installed(&self) -> bool {
        self.bear_installed
    }

    fn set_launch_at_login(&self, enabled: bool) -> HelperResult<()> {
        *self
            .launch_at_login
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(enabled);
        Ok(())
    }
}
