//! Note workflows: each one sends a Bear request and, where Bear answers with a
//! callback, registers the continuation the router resumes.

use std::sync::Arc;

use crate::bear::{CallbackAction, NoteAction};
use crate::context::HelperContext;
use crate::pending::{Continuation, LookupOutcome};
use crate::settings::DefaultAction;
use crate::template::{find_daily_template, find_template_by_name, note_templates};
use crate::utils::time::today_local;

/// Days on each side of today covered by a full sync.
pub const SYNC_WINDOW_DAYS: i64 = 7;

#[derive(Clone)]
pub struct NoteWorkflows {
    ctx: Arc<HelperContext>,
}

impl NoteWorkflows {
    pub fn new(ctx: Arc<HelperContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<HelperContext> {
        &self.ctx
    }

    fn send(&self, action: &NoteAction) {
        self.ctx.dispatcher().dispatch(action);
    }

    /// Registers `continuation` and returns the callback URL for each accepted host, in order.
    fn expect(&self, continuation: Continuation, accepts: &[CallbackAction]) -> Vec<String> {
        let id = self.ctx.pending().register(continuation, accepts);
        accepts
            .iter()
            .map(|action| action.callback_url(id))
            .collect()
    }

    async fn date_or_today(&self, date: Option<&str>) -> String {
        match date.map(str::trim).filter(|date| !date.is_empty()) {
            Some(date) => date.to_string(),
            None => self.ctx.today_string().await,
        }
    }

    async fn events_for(&self, date: &str) -> String {
        let settings = self.ctx.settings().await;
        let engine = self.ctx.engine().await;
        self.ctx
            .calendar()
            .render(date, engine.date_format(), &settings.selected_calendars())
            .await
    }

    // Home note

    pub async fn open_home_note(&self) {
        let home = self.ctx.settings().await.home_note_id;
        if home.is_empty() {
            tracing::warn!("no home note configured");
            return;
        }
        self.update_home_note_if_needed().await;
        self.send(&NoteAction::open_by_id(home));
    }

    pub async fn update_home_note_if_needed(&self) {
        let home = self.ctx.settings().await.home_note_id;
        if home.is_empty() {
            tracing::warn!("no home note configured");
            return;
        }
        let urls = self.expect(
            Continuation::UpdateHomeNote,
            &[
                CallbackAction::UpdateHomeNoteSuccess,
                CallbackAction::UpdateHomeNoteError,
            ],
        );
        self.send(
            &NoteAction::open_by_id(home)
                .in_background()
                .on_success(&urls[0])
                .on_error(&urls[1]),
        );
    }

    /// Rewrites the fetched home note body for today and sends it back if it changed.
    pub async fn apply_home_note(&self, note: &str) {
        let home = self.ctx.settings().await.home_note_id;
        if home.is_empty() {
            tracing::warn!("home note body arrived but no home note is configured");
            return;
        }
        let today = self.ctx.today_string().await;
        let events = self.events_for(&today).await;
        let updated = self.ctx.engine().await.refresh_home_note(note, &today, &events);
        if updated == note {
            tracing::debug!("home note already up to date");
            return;
        }
        self.send(
            &NoteAction::replace_text(home, updated)
                .in_background()
                .new_window(false),
        );
    }

    // Daily notes

    /// Refreshes the daily note for `date` (today by default), then opens it,
    /// creating it when Bear cannot find it.
    pub async fn open_daily_note(&self, date: Option<&str>) {
        let date = self.date_or_today(date).await;
        self.update_daily_note_if_needed(&date, true).await;
        let urls = self.expect(
            Continuation::OpenDailyNote { date: date.clone() },
            &[
                CallbackAction::OpenDailyNoteSuccess,
                CallbackAction::OpenDailyNoteError,
            ],
        );
        self.send(
            &NoteAction::open_by_title(date)
                .in_background()
                .exclude_trashed(true)
                .on_success(&urls[0])
                .on_error(&urls[1]),
        );
    }

    pub fn open_note(&self, identifier: &str) {
        self.send(&NoteAction::open_by_id(identifier));
    }

    /// Fetches the daily note titled `date` so its calendar block can be refreshed.
    /// With `open`, the note is brought forward after the update.
    pub async fn update_daily_note_if_needed(&self, date: &str, open: bool) {
        let success = if open {
            CallbackAction::UpdateDailyNoteSuccess
        } else {
            CallbackAction::UpdateDailyNoteSuccessForSync
        };
        let urls = self.expect(
            Continuation::UpdateDailyNote,
            &[success, CallbackAction::UpdateDailyNoteError],
        );
        self.send(
            &NoteAction::open_by_title(date)
                .in_background()
                .on_success(&urls[0])
                .on_error(&urls[1]),
        );
    }

    pub async fn sync_date(&self, date: Option<&str>) {
        let date = self.date_or_today(date).await;
        self.update_daily_note_if_needed(&date, false).await;
    }

    /// Syncs every daily note from a week before today to a week after.
    pub async fn sync_now(&self) -> usize {
        let format = self.ctx.engine().await.date_format().clone();
        let today = today_local();
        let mut sent = 0;
        for offset in -SYNC_WINDOW_DAYS..=SYNC_WINDOW_DAYS {
            let Some(date) = format.format_offset(today, offset) else {
                continue;
            };
            self.update_daily_note_if_needed(&date, false).await;
            sent += 1;
        }
        tracing::info!("requested calendar sync for {sent} daily notes");
        sent
    }

    pub async fn sync_note_by_id(&self, id: &str) {
        let urls = self.expect(
            Continuation::UpdateDailyNote,
            &[
                CallbackAction::UpdateDailyNoteSuccessForSync,
                CallbackAction::UpdateDailyNoteError,
            ],
        );
        self.send(
            &NoteAction::open_by_id(id)
                .in_background()
                .on_success(&urls[0])
                .on_error(&urls[1]),
        );
    }

    /// Fills the calendar block of a fetched daily note with the events of its title's day.
    pub async fn apply_daily_note(&self, title: &str, note: &str, identifier: &str, open: bool) {
        let events = self.events_for(title).await;
        let edit = self
            .ctx
            .engine()
            .await
            .replace_calendar_section(note, &events);
        let changed = edit.is_replaced() && edit.content() != note;

        if changed {
            self.send(
                &NoteAction::replace_text(identifier, edit.into_content())
                    .open_note(open)
                    .show_window(open),
            );
        } else if open {
            tracing::debug!("daily note '{title}' unchanged; opening as is");
            self.open_note(identifier);
        } else {
            tracing::debug!("daily note '{title}' unchanged");
        }
    }

    /// Creates the daily note for `date` from the daily template.
    pub async fn create_daily_note(&self, date: Option<&str>) {
        let date = self.date_or_today(date).await;
        let settings = self.ctx.settings().await;
        let Some(template) = find_daily_template(&settings.templates) else {
            tracing::warn!("no daily template configured; cannot create note for {date}");
            return;
        };
        let events = self.events_for(&date).await;
        let content = self
            .ctx
            .engine()
            .await
            .render_daily_note(&template.content, &date, &events);

        let mut tags = vec![template.tag.clone()];
        if !settings.daily_note_tag.is_empty() && settings.daily_note_tag != template.tag {
            tags.push(settings.daily_note_tag.clone());
        }

        let urls = self.expect(
            Continuation::ReplaceSyncPlaceholder,
            &[CallbackAction::ReplaceSyncPlaceholder],
        );
        tracing::info!("creating daily note for {date}");
        self.send(
            &NoteAction::create(content)
                .tags(&tags)
                .in_background()
                .on_success(&urls[0]),
        );
    }

    /// A freshly created note is fetched again so its body comes back through a callback.
    pub fn fetch_created_note(&self, identifier: &str) {
        let urls = self.expect(
            Continuation::ReplaceSyncPlaceholderAction,
            &[CallbackAction::ReplaceSyncPlaceholderAction],
        );
        self.send(
            &NoteAction::open_by_id(identifier)
                .in_background()
                .on_success(&urls[0]),
        );
    }

    /// Looks up the daily note for `date`. An existing note is synced; otherwise,
    /// including on timeout, the note is created.
    pub async fn ensure_daily_note(&self, date: Option<&str>) -> LookupOutcome {
        let date = self.date_or_today(date).await;
        let settings = self.ctx.settings().await;
        let ticket = self.ctx.pending().begin_lookup(date.clone());

        let mut search = NoteAction::search(date.clone())
            .on_success(ticket.success_url())
            .on_error(ticket.error_url());
        if !settings.daily_note_tag.is_empty() {
            search = search.tag(settings.daily_note_tag.clone());
        }
        if !settings.bear_token.is_empty() {
            search = search.token(settings.bear_token.clone());
        }
        self.send(&search);

        let outcome = ticket.wait(self.ctx.lookup_timeout()).await;
        match &outcome {
            LookupOutcome::Found(note) => self.sync_note_by_id(&note.id).await,
            LookupOutcome::Empty | LookupOutcome::TimedOut => {
                self.create_daily_note(Some(&date)).await
            }
        }
        outcome
    }

    // Templates and events

    /// Creates a note from the non-daily template named `name`, anchored at today.
    pub async fn create_note_from_template(&self, name: &str) -> bool {
        let settings = self.ctx.settings().await;
        let Some(template) = find_template_by_name(&settings.templates, name) else {
            tracing::warn!("no template named '{name}'");
            return false;
        };
        let today = self.ctx.today_string().await;
        let content = self
            .ctx
            .engine()
            .await
            .render_placeholders(&template.content, &today);
        self.send(&NoteAction::create(content).tags(&[template.tag.as_str()]));
        true
    }

    /// Creates a note holding today's event checklist.
    pub async fn create_note_with_today_events(&self) {
        let today = self.ctx.today_string().await;
        let events = self.events_for(&today).await;
        self.send(&NoteAction::create(events));
    }

    /// Saves the login-item preference and applies it right away.
    pub async fn set_launch_at_login(&self, enabled: bool) {
        if let Err(error) = self
            .ctx
            .update_settings(|settings| settings.launch_at_login = enabled)
            .await
        {
            tracing::warn!("failed to save launch at login: {error}");
            return;
        }
        if let Err(error) = self.ctx.apply_launch_at_login().await {
            tracing::warn!("failed to apply launch at login: {error}");
        }
    }

    /// Names of the templates that can be used for ad hoc notes.
    pub async fn note_template_names(&self) -> Vec<String> {
        note_templates(&self.ctx.settings().await.templates)
            .map(|template| template.name.clone())
            .collect()
    }

    pub async fn perform_default_action(&self) {
        match self.ctx.settings().await.default_action {
            DefaultAction::Disabled => tracing::info!("default action is disabled"),
            DefaultAction::Home => self.open_home_note().await,
            DefaultAction::Daily => self.open_daily_note(None).await,
        }
    }
}
