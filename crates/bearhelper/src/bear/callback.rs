use std::borrow::Cow;
use std::fmt;

use url::Url;
use uuid::Uuid;

use super::encoding::{build_query, parse_query};

pub const CALLBACK_SCHEME: &str = "fodabear";
pub const REQUEST_ID_PARAM: &str = "request_id";

/// Hosts of the inbound `fodabear://` URLs this helper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
    UpdateHomeNoteSuccess,
    UpdateHomeNoteError,
    UpdateDailyNoteSuccess,
    UpdateDailyNoteSuccessForSync,
    UpdateDailyNoteError,
    OpenDailyNoteSuccess,
    OpenDailyNoteError,
    SyncNote,
    ReplaceSyncPlaceholder,
    ReplaceSyncPlaceholderAction,
    OpenDailyNoteForDate,
    CreateDailyNoteForDate,
    LookupNoteSuccess,
    LookupNoteError,
}

impl CallbackAction {
    pub const ALL: [CallbackAction; 14] = [
        CallbackAction::UpdateHomeNoteSuccess,
        CallbackAction::UpdateHomeNoteError,
        CallbackAction::UpdateDailyNoteSuccess,
        CallbackAction::UpdateDailyNoteSuccessForSync,
        CallbackAction::UpdateDailyNoteError,
        CallbackAction::OpenDailyNoteSuccess,
        CallbackAction::OpenDailyNoteError,
        CallbackAction::SyncNote,
        CallbackAction::ReplaceSyncPlaceholder,
        CallbackAction::ReplaceSyncPlaceholderAction,
        CallbackAction::OpenDailyNoteForDate,
        CallbackAction::CreateDailyNoteForDate,
        CallbackAction::LookupNoteSuccess,
        CallbackAction::LookupNoteError,
    ];

    pub fn host(self) -> &'static str {
        match self {
            CallbackAction::UpdateHomeNoteSuccess => "update-home-note-if-needed-success",
            CallbackAction::UpdateHomeNoteError => "update-home-note-if-needed-error",
            CallbackAction::UpdateDailyNoteSuccess => "update-daily-note-if-needed-success",
            CallbackAction::UpdateDailyNoteSuccessForSync => {
                "update-daily-note-if-needed-success-for-sync"
            }
            CallbackAction::UpdateDailyNoteError => "update-daily-note-if-needed-error",
            CallbackAction::OpenDailyNoteSuccess => "open-daily-note-success",
            CallbackAction::OpenDailyNoteError => "open-daily-note-error",
            CallbackAction::SyncNote => "sync-note",
            CallbackAction::ReplaceSyncPlaceholder => "replace-sync-placeholder",
            CallbackAction::ReplaceSyncPlaceholderAction => "replace-sync-placeholder-action",
            CallbackAction::OpenDailyNoteForDate => "open-daily-note-for-date",
            CallbackAction::CreateDailyNoteForDate => "create-daily-note-for-date",
            CallbackAction::LookupNoteSuccess => "lookup-note-success",
            CallbackAction::LookupNoteError => "lookup-note-error",
        }
    }

    pub fn from_host(host: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.host().eq_ignore_ascii_case(host))
    }

    /// Entry points may arrive unsolicited and carry no request id.
    pub fn is_entry_point(self) -> bool {
        matches!(
            self,
            CallbackAction::SyncNote
                | CallbackAction::OpenDailyNoteForDate
                | CallbackAction::CreateDailyNoteForDate
        )
    }

    /// Query parameters that must be present before the callback is acted on.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            CallbackAction::UpdateHomeNoteSuccess => &["note"],
            CallbackAction::UpdateDailyNoteSuccess
            | CallbackAction::UpdateDailyNoteSuccessForSync
            | CallbackAction::ReplaceSyncPlaceholderAction => &["title", "note", "identifier"],
            CallbackAction::OpenDailyNoteSuccess | CallbackAction::ReplaceSyncPlaceholder => {
                &["identifier"]
            }
            CallbackAction::SyncNote => &["id"],
            CallbackAction::OpenDailyNoteForDate | CallbackAction::CreateDailyNoteForDate => {
                &["date"]
            }
            CallbackAction::LookupNoteSuccess => &["notes"],
            CallbackAction::UpdateHomeNoteError
            | CallbackAction::UpdateDailyNoteError
            | CallbackAction::OpenDailyNoteError
            | CallbackAction::LookupNoteError => &[],
        }
    }

    /// `fodabear://<host>?request_id=<id>`, the URL handed to Bear as `x-success`/`x-error`.
    pub fn callback_url(self, request_id: Uuid) -> String {
        format!(
            "{CALLBACK_SCHEME}://{}?{}",
            self.host(),
            build_query([(REQUEST_ID_PARAM, Cow::Owned(request_id.to_string()))])
        )
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}

/// A parsed inbound URL of the callback scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCallback {
    pub host: String,
    pub params: Vec<(String, String)>,
}

impl InboundCallback {
    /// Returns `None` unless `url` parses and uses the `fodabear` scheme.
    ///
    /// Values are decoded by [`parse_query`] so that `+` stays literal.
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url.trim()).ok()?;
        if parsed.scheme() != CALLBACK_SCHEME {
            return None;
        }
        let host = parsed.host_str().unwrap_or_default();
        Some(Self {
            host: host.to_ascii_lowercase(),
            params: parse_query(parsed.query().unwrap_or_default()),
        })
    }

    pub fn action(&self) -> Option<CallbackAction> {
        CallbackAction::from_host(&self.host)
    }

    /// First value for `name`. Empty values count as present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn request_id(&self) -> Option<Uuid> {
        self.param(REQUEST_ID_PARAM)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// The first required parameter of `action` this URL lacks.
    pub fn missing_param(&self, action: CallbackAction) -> Option<&'static str> {
        action
            .required_params()
            .iter()
            .copied()
            .find(|name| self.param(name).is_none())
    }
}
