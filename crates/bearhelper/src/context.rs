use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::calendar::{CalendarBridge, SharedCalendarStore};
use crate::dispatch::NoteDispatcher;
use crate::error::HelperResult;
use crate::pending::{PendingRegistry, DEFAULT_LOOKUP_TIMEOUT};
use crate::platform::SharedPlatform;
use crate::settings::{write_settings, Settings};
use crate::template::TemplateEngine;
use crate::utils::time::today_local;

/// Everything the helper shares between the command loop and the callback router.
///
/// Built once at startup; the template engine is rebuilt whenever settings change.
pub struct HelperContext {
    state: RwLock<ContextState>,
    settings_path: Option<PathBuf>,
    calendar: CalendarBridge,
    dispatcher: NoteDispatcher,
    pending: Arc<PendingRegistry>,
    lookup_timeout: Duration,
}

struct ContextState {
    settings: Settings,
    engine: Arc<TemplateEngine>,
}

impl HelperContext {
    pub fn new(
        settings: Settings,
        platform: SharedPlatform,
        calendar_store: SharedCalendarStore,
    ) -> HelperResult<Self> {
        let engine = Arc::new(build_engine(&settings)?);
        Ok(Self {
            state: RwLock::new(ContextState { settings, engine }),
            settings_path: None,
            calendar: CalendarBridge::new(calendar_store),
            dispatcher: NoteDispatcher::new(platform),
            pending: Arc::new(PendingRegistry::new()),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        })
    }

    /// Persist settings changes to `path`.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    pub async fn engine(&self) -> Arc<TemplateEngine> {
        self.state.read().await.engine.clone()
    }

    /// Applies `edit`, rebuilds the engine and persists. Nothing changes if the
    /// edited settings cannot produce an engine.
    pub async fn update_settings<F>(&self, edit: F) -> HelperResult<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut state = self.state.write().await;
        let mut next = state.settings.clone();
        edit(&mut next);
        let engine = Arc::new(build_engine(&next)?);
        if let Some(path) = &self.settings_path {
            write_settings(path, &next)?;
        }
        state.settings = next.clone();
        state.engine = engine;
        Ok(next)
    }

    /// Registers or removes the login item to match the saved preference.
    pub async fn apply_launch_at_login(&self) -> HelperResult<()> {
        let enabled = self.settings().await.launch_at_login;
        self.dispatcher.platform().set_launch_at_login(enabled)
    }

    /// Today in the configured date format.
    pub async fn today_string(&self) -> String {
        self.engine().await.date_format().format(today_local())
    }

    pub fn calendar(&self) -> &CalendarBridge {
        &self.calendar
    }

    pub fn dispatcher(&self) -> &NoteDispatcher {
        &self.dispatcher
    }

    pub fn pending(&self) -> &Arc<PendingRegistry> {
        &self.pending
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }
}

fn build_engine(settings: &Settings) -> HelperResult<TemplateEngine> {
    TemplateEngine::new(
        settings.date_format()?,
        &settings.calendar_section_header,
        &settings.daily_section_header,
    )
}
