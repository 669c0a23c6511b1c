use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::bear::CallbackAction;

pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do when the callback for a request arrives.
#[derive(Debug)]
pub enum Continuation {
    /// Refresh the home note from the fetched body.
    UpdateHomeNote,
    /// Refresh a daily note's calendar block. The callback host decides whether it opens.
    UpdateDailyNote,
    /// Open the found daily note, or create it for `date` on error.
    OpenDailyNote { date: String },
    /// A daily note was created; fetch it again by identifier.
    ReplaceSyncPlaceholder,
    /// The created note was fetched; fill its calendar block and open it.
    ReplaceSyncPlaceholderAction,
    /// Resolve a waiting lookup for a note titled `title`.
    Lookup {
        title: String,
        responder: oneshot::Sender<LookupOutcome>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(NoteSnapshot),
    Empty,
    TimedOut,
}

#[derive(Debug)]
struct PendingEntry {
    continuation: Continuation,
    accepts: Vec<CallbackAction>,
    registered_at: Instant,
}

/// Outbound requests waiting for their callback, keyed by request id.
#[derive(Debug)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<Uuid, PendingEntry>>,
    ttl: Duration,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_PENDING_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Registers a continuation that only the hosts in `accepts` may resume.
    pub fn register(&self, continuation: Continuation, accepts: &[CallbackAction]) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.lock();
        let swept = sweep(&mut entries, Instant::now(), self.ttl);
        if swept > 0 {
            tracing::debug!("dropped {swept} expired pending requests");
        }
        entries.insert(
            id,
            PendingEntry {
                continuation,
                accepts: accepts.to_vec(),
                registered_at: Instant::now(),
            },
        );
        id
    }

    /// Removes and returns the continuation for `id` if `action` may resume it.
    /// Anything else leaves the table untouched.
    pub fn take(&self, id: Uuid, action: CallbackAction) -> Option<Continuation> {
        let mut entries = self.lock();
        let Some(entry) = entries.get(&id) else {
            tracing::warn!("received callback {action} for unknown request {id}");
            return None;
        };
        if !entry.accepts.contains(&action) {
            tracing::warn!("request {id} does not expect callback {action}");
            return None;
        }
        entries.remove(&id).map(|entry| entry.continuation)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops entries older than the TTL as of `now`. Returns how many were dropped.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        sweep(&mut self.lock(), now, self.ttl)
    }

    /// Registers a lookup for a note titled `title`.
    ///
    /// The entry lives as long as the returned ticket; dropping the ticket
    /// (or the future waiting on it) withdraws the request.
    pub fn begin_lookup(self: &Arc<Self>, title: impl Into<String>) -> LookupTicket {
        let (responder, receiver) = oneshot::channel();
        let id = self.register(
            Continuation::Lookup {
                title: title.into(),
                responder,
            },
            &[CallbackAction::LookupNoteSuccess, CallbackAction::LookupNoteError],
        );
        LookupTicket {
            id,
            receiver,
            registry: Arc::clone(self),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PendingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep(entries: &mut HashMap<Uuid, PendingEntry>, now: Instant, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.registered_at) <= ttl);
    before - entries.len()
}

/// A registered lookup waiting for Bear's search callback.
#[derive(Debug)]
pub struct LookupTicket {
    id: Uuid,
    receiver: oneshot::Receiver<LookupOutcome>,
    registry: Arc<PendingRegistry>,
}

impl LookupTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn success_url(&self) -> String {
        CallbackAction::LookupNoteSuccess.callback_url(self.id)
    }

    pub fn error_url(&self) -> String {
        CallbackAction::LookupNoteError.callback_url(self.id)
    }

    pub async fn wait(mut self, timeout: Duration) -> LookupOutcome {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                tracing::debug!("lookup {} was withdrawn", self.id);
                LookupOutcome::Empty
            }
            Err(_) => {
                tracing::warn!("lookup {} timed out after {timeout:?}", self.id);
                LookupOutcome::TimedOut
            }
        }
    }
}

impl Drop for LookupTicket {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    identifier: String,
}

/// Picks the note titled exactly `title` out of a search callback's `notes` JSON.
pub fn resolve_lookup(title: &str, notes_json: &str) -> LookupOutcome {
    let hits: Vec<SearchHit> = match serde_json::from_str(notes_json) {
        Ok(hits) => hits,
        Err(error) => {
            tracing::warn!("unreadable search results: {error}");
            return LookupOutcome::Empty;
        }
    };
    hits.into_iter()
        .find(|hit| hit.title.trim() == title.trim() && !hit.identifier.is_empty())
        .map(|hit| {
            LookupOutcome::Found(NoteSnapshot {
                id: hit.identifier,
                title: hit.title,
            })
        })
        .unwrap_or(LookupOutcome::Empty)
}
