use std::process::{Command, ExitStatus, Stdio};

use super::Platform;
use crate::error::{HelperError, HelperResult};
use crate::platform::launch_agent::apply_launch_agent;

const BEAR_APP_NAME: &str = "Bear";

#[derive(Debug, Default)]
pub struct MacosPlatform;

impl MacosPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for MacosPlatform {
    fn id(&self) -> &str {
        "macos"
    }

    fn open_url(&self, url: &str) -> HelperResult<()> {
        // -g keeps the helper from stealing focus; Bear decides via show_window.
        let status = Command::new("open")
            .arg("-g")
            .arg(url)
            .status()
            .map_err(|error| HelperError::Internal(format!("failed to run open: {error}")))?;
        ensure_command_success(status, "open")
    }

    fn is_bear_installed(&self) -> bool {
        // -R reveals instead of launching; it fails when no such app is registered.
        Command::new("open")
            .args(["-Ra", BEAR_APP_NAME])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn set_launch_at_login(&self, enabled: bool) -> HelperResult<()> {
        let agents_dir = dirs::home_dir()
            .map(|home| home.join("Library").join("LaunchAgents"))
            .ok_or_else(|| HelperError::Internal("no home directory".to_string()))?;
        let program = std::env::current_exe().map_err(|error| {
            HelperError::Internal(format!("failed to locate helper executable: {error}"))
        })?;
        if apply_launch_agent(&agents_dir, &program, enabled)? {
            tracing::info!("launch at login {}", if enabled { "enabled" } else { "disabled" });
        }
        Ok(())
    }
}

fn ensure_command_success(status: ExitStatus, command_label: &str) -> HelperResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(HelperError::Internal(format!(
            "{command_label} failed with status {status}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_macos_id() {
        assert_eq!(MacosPlatform::new().id(), "macos");
    }
}
