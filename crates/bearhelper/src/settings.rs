use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{DateFormat, CUSTOM_DATE_PATTERN, DEFAULT_DATE_PATTERN};
use crate::error::{HelperError, HelperResult};
use crate::template::{
    remove_templates, upsert_template, Template, DEFAULT_CALENDAR_SECTION_HEADER,
    DEFAULT_DAILY_SECTION_HEADER,
};
use crate::utils::time::now_secs;

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const SETTINGS_VERSION: &str = "1.0.0";
pub const SETTINGS_DIR_NAME: &str = "bearhelper";
pub const CONFIG_DIR_ENV: &str = "BEARHELPER_CONFIG_DIR";

/// What a plain click on the helper does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultAction {
    Disabled,
    #[default]
    Home,
    Daily,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_modified: u64,
    #[serde(default)]
    pub home_note_id: String,
    #[serde(default)]
    pub default_action: DefaultAction,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub launch_at_login: bool,
    #[serde(default = "default_calendar_header")]
    pub calendar_section_header: String,
    #[serde(default = "default_daily_header")]
    pub daily_section_header: String,
    #[serde(default)]
    pub daily_note_tag: String,
    /// Bear API token, required by Bear for search callbacks.
    #[serde(default)]
    pub bear_token: String,
    #[serde(default = "default_date_pattern")]
    pub selected_date_format: String,
    #[serde(default)]
    pub custom_date_format: String,
    #[serde(default)]
    pub selected_calendar_ids: Vec<String>,
}

fn default_calendar_header() -> String {
    DEFAULT_CALENDAR_SECTION_HEADER.to_string()
}

fn default_daily_header() -> String {
    DEFAULT_DAILY_SECTION_HEADER.to_string()
}

fn default_date_pattern() -> String {
    DEFAULT_DATE_PATTERN.to_string()
}

impl Settings {
    pub fn default_new() -> Self {
        Self {
            version: SETTINGS_VERSION.to_string(),
            last_modified: now_secs(),
            home_note_id: String::new(),
            default_action: DefaultAction::Home,
            templates: vec![Template::default_daily()],
            launch_at_login: false,
            calendar_section_header: default_calendar_header(),
            daily_section_header: default_daily_header(),
            daily_note_tag: String::new(),
            bear_token: String::new(),
            selected_date_format: default_date_pattern(),
            custom_date_format: String::new(),
            selected_calendar_ids: Vec::new(),
        }
    }

    /// The pattern in effect: the custom one when the custom sentinel is selected.
    pub fn effective_date_pattern(&self) -> &str {
        if self.selected_date_format == CUSTOM_DATE_PATTERN {
            &self.custom_date_format
        } else {
            &self.selected_date_format
        }
    }

    pub fn date_format(&self) -> HelperResult<DateFormat> {
        DateFormat::new(self.effective_date_pattern())
    }

    pub fn selected_calendars(&self) -> HashSet<String> {
        self.selected_calendar_ids.iter().cloned().collect()
    }

    pub fn upsert_template(&mut self, template: Template) {
        upsert_template(&mut self.templates, template);
    }

    pub fn remove_templates(&mut self, ids: &HashSet<Uuid>) -> usize {
        remove_templates(&mut self.templates, ids)
    }

    /// Repairs values the rest of the helper cannot work with. Returns whether anything changed.
    fn normalize(&mut self) -> bool {
        let mut changed = false;
        if let Err(error) = self.date_format() {
            tracing::warn!(
                "date pattern '{}' is unusable, falling back to {DEFAULT_DATE_PATTERN}: {error}",
                self.effective_date_pattern()
            );
            self.selected_date_format = default_date_pattern();
            changed = true;
        }
        if self.templates.is_empty() {
            self.templates.push(Template::default_daily());
            changed = true;
        }
        if self.calendar_section_header.trim().is_empty() {
            self.calendar_section_header = default_calendar_header();
            changed = true;
        }
        if self.daily_section_header.trim().is_empty() {
            self.daily_section_header = default_daily_header();
            changed = true;
        }
        changed
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_new()
    }
}

/// `$BEARHELPER_CONFIG_DIR`, else `<config dir>/bearhelper`.
pub fn default_settings_dir() -> HelperResult<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join(SETTINGS_DIR_NAME))
        .ok_or_else(|| HelperError::Internal("no configuration directory available".to_string()))
}

pub fn settings_path(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILENAME)
}

pub fn load_or_create_settings(dir: &Path) -> HelperResult<Settings> {
    std::fs::create_dir_all(dir).map_err(|error| {
        HelperError::Internal(format!(
            "failed to create settings directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = settings_path(dir);
    if !path.exists() {
        let settings = Settings::default_new();
        write_settings(&path, &settings)?;
        return Ok(settings);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        HelperError::Internal(format!(
            "failed to read settings {}: {error}",
            path.display()
        ))
    })?;
    let mut settings: Settings = serde_json::from_str(&data).map_err(|error| {
        HelperError::Internal(format!(
            "failed to parse settings {}: {error}",
            path.display()
        ))
    })?;

    let mut dirty = false;
    if settings.version != SETTINGS_VERSION {
        settings = migrate_settings(settings)?;
        dirty = true;
    }
    dirty |= settings.normalize();
    if dirty {
        write_settings(&path, &settings)?;
    }

    Ok(settings)
}

/// Brings settings written by an older release up to [`SETTINGS_VERSION`].
///
/// Fields added since then are filled by their serde defaults on load.
pub fn migrate_settings(mut settings: Settings) -> HelperResult<Settings> {
    if is_newer_version(&settings.version) {
        return Err(HelperError::InvalidInput(format!(
            "settings version {} is newer than supported {SETTINGS_VERSION}",
            settings.version
        )));
    }
    tracing::info!(
        "migrating settings from version '{}' to {SETTINGS_VERSION}",
        settings.version
    );
    settings.version = SETTINGS_VERSION.to_string();
    Ok(settings)
}

fn is_newer_version(version: &str) -> bool {
    fn parts(version: &str) -> Vec<u64> {
        version
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    }
    parts(version) > parts(SETTINGS_VERSION)
}

pub fn write_settings(path: &Path, settings: &Settings) -> HelperResult<()> {
    let mut settings = settings.clone();
    settings.last_modified = now_secs();
    let data = serde_json::to_string_pretty(&settings).map_err(|error| {
        HelperError::Internal(format!(
            "failed to serialize settings {}: {error}",
            path.display()
        ))
    })?;
    std::fs::write(path, data).map_err(|error| {
        HelperError::Internal(format!(
            "failed to write settings {}: {error}",
            path.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_settings_when_missing() {
        let dir = tempdir().expect("tempdir");
        let settings = load_or_create_settings(dir.path()).expect("load/create");

        assert!(settings_path(dir.path()).exists());
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.default_action, DefaultAction::Home);
        assert_eq!(settings.templates.len(), 1);
        assert!(settings.templates[0].is_daily);
        assert_eq!(settings.effective_date_pattern(), DEFAULT_DATE_PATTERN);
    }

    #[test]
    fn loads_existing_settings() {
        let dir = tempdir().expect("tempdir");
        let mut original = Settings::default_new();
        original.home_note_id = "HOME-1".to_string();
        original.selected_calendar_ids = vec!["work".to_string()];
        write_settings(&settings_path(dir.path()), &original).expect("write");

        let loaded = load_or_create_settings(dir.path()).expect("load");
        assert_eq!(loaded.home_note_id, "HOME-1");
        assert_eq!(loaded.templates, original.templates);
        assert!(loaded.selected_calendars().contains("work"));
    }

    #[test]
    fn old_files_are_migrated_and_filled_with_defaults() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            settings_path(dir.path()),
            r#"{"homeNoteId":"H","defaultAction":"daily","templates":[]}"#,
        )
        .expect("write");

        let loaded = load_or_create_settings(dir.path()).expect("load");
        assert_eq!(loaded.version, SETTINGS_VERSION);
        assert_eq!(loaded.default_action, DefaultAction::Daily);
        assert_eq!(loaded.calendar_section_header, "## Calendar Events");
        assert_eq!(loaded.templates.len(), 1);

        let persisted = std::fs::read_to_string(settings_path(dir.path())).expect("read");
        assert!(persisted.contains(SETTINGS_VERSION));
    }

    #[test]
    fn newer_versions_are_refused() {
        let mut settings = Settings::default_new();
        settings.version = "9.0.0".to_string();
        let err = migrate_settings(settings).expect_err("expected error");
        match err {
            HelperError::InvalidInput(message) => assert!(message.contains("9.0.0")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn invalid_custom_pattern_falls_back() {
        let dir = tempdir().expect("tempdir");
        let mut original = Settings::default_new();
        original.selected_date_format = CUSTOM_DATE_PATTERN.to_string();
        original.custom_date_format = "qqq".to_string();
        write_settings(&settings_path(dir.path()), &original).expect("write");

        let loaded = load_or_create_settings(dir.path()).expect("load");
        assert_eq!(loaded.effective_date_pattern(), DEFAULT_DATE_PATTERN);
    }

    #[test]
    fn custom_pattern_is_used_when_selected() {
        let mut settings = Settings::default_new();
        settings.selected_date_format = CUSTOM_DATE_PATTERN.to_string();
        settings.custom_date_format = "dd.MM.yyyy".to_string();
        assert_eq!(settings.effective_date_pattern(), "dd.MM.yyyy");
        assert!(settings.date_format().is_ok());
    }

    #[test]
    fn template_edits_go_through_settings() {
        let mut settings = Settings::default_new();
        let mut weekly = Template::new("Weekly", "# Week of %date()%", "weekly");
        settings.upsert_template(weekly.clone());
        weekly.content = "# Week %date(+7)%".to_string();
        settings.upsert_template(weekly.clone());
        assert_eq!(settings.templates.len(), 2);
        assert_eq!(settings.templates[1].content, "# Week %date(+7)%");

        let removed = settings.remove_templates(&HashSet::from([weekly.id]));
        assert_eq!(removed, 1);
        assert_eq!(settings.templates.len(), 1);
    }
}
