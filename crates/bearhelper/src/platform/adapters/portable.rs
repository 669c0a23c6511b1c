use super::Platform;
use crate::error::{HelperError, HelperResult};

/// Fallback for hosts without Bear. URLs cannot be delivered anywhere.
#[derive(Debug, Default)]
pub struct PortablePlatform;

impl PortablePlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for PortablePlatform {
    fn id(&self) -> &str {
        "unsupported"
    }

    fn open_url(&self, url: &str) -> HelperResult<()> {
        let scheme = url.split_once(':').map(|(scheme, _)| scheme).unwrap_or(url);
        Err(HelperError::Unsupported(format!(
            "no handler for {scheme} URLs on this platform"
        )))
    }

    fn is_bear_installed(&self) -> bool {
        false
    }

    fn set_launch_at_login(&self, _enabled: bool) -> HelperResult<()> {
        Err(HelperError::Unsupported(
            "login items are not available on this platform".to_string(),
        ))
    }
}
