use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{HelperError, HelperResult};

pub const LAUNCH_AGENT_LABEL: &str = "com.bearhelper.agent";

/// The property list launchd reads from `~/Library/LaunchAgents`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LaunchAgent<'a> {
    label: &'a str,
    program_arguments: Vec<String>,
    run_at_load: bool,
}

pub fn launch_agent_path(agents_dir: &Path) -> PathBuf {
    agents_dir.join(format!("{LAUNCH_AGENT_LABEL}.plist"))
}

/// Writes or removes the launch agent for `program`. Returns whether the file changed.
pub fn apply_launch_agent(agents_dir: &Path, program: &Path, enabled: bool) -> HelperResult<bool> {
    let path = launch_agent_path(agents_dir);
    if !enabled {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|error| {
            HelperError::Internal(format!(
                "failed to remove launch agent {}: {error}",
                path.display()
            ))
        })?;
        return Ok(true);
    }

    std::fs::create_dir_all(agents_dir).map_err(|error| {
        HelperError::Internal(format!(
            "failed to create {}: {error}",
            agents_dir.display()
        ))
    })?;
    let agent = LaunchAgent {
        label: LAUNCH_AGENT_LABEL,
        program_arguments: vec![program.to_string_lossy().into_owned()],
        run_at_load: true,
    };
    plist::to_file_xml(&path, &agent).map_err(|error| {
        HelperError::Internal(format!(
            "failed to write launch agent {}: {error}",
            path.display()
        ))
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_and_removes_agent() {
        let dir = tempdir().expect("tempdir");
        let agents = dir.path().join("LaunchAgents");
        let program = Path::new("/Applications/Bear Helper/bearhelper");

        assert!(apply_launch_agent(&agents, program, true).expect("write"));
        let value = plist::Value::from_file(launch_agent_path(&agents)).expect("read");
        let dict = value.as_dictionary().expect("dictionary");
        assert_eq!(
            dict.get("Label").and_then(plist::Value::as_string),
            Some(LAUNCH_AGENT_LABEL)
        );
        assert_eq!(
            dict.get("RunAtLoad").and_then(plist::Value::as_boolean),
            Some(true)
        );
        let args = dict
            .get("ProgramArguments")
            .and_then(plist::Value::as_array)
            .expect("arguments");
        assert_eq!(
            args[0].as_string(),
            Some("/Applications/Bear Helper/bearhelper")
        );

        assert!(apply_launch_agent(&agents, program, false).expect("remove"));
        assert!(!launch_agent_path(&agents).exists());
        assert!(!apply_launch_agent(&agents, program, false).expect("noop"));
    }
}
