use std::borrow::Cow;
use std::fmt;

use super::encoding::build_query;

pub const BEAR_URL_BASE: &str = "bear://x-callback-url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteVerb {
    Create,
    OpenNote,
    AddText,
    Search,
}

impl NoteVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteVerb::Create => "create",
            NoteVerb::OpenNote => "open-note",
            NoteVerb::AddText => "add-text",
            NoteVerb::Search => "search",
        }
    }
}

impl fmt::Display for NoteVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound Bear request. Parameters keep insertion order; setting a key twice
/// overwrites the earlier value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteAction {
    verb: NoteVerb,
    params: Vec<(&'static str, String)>,
}

impl NoteAction {
    pub fn new(verb: NoteVerb) -> Self {
        Self {
            verb,
            params: Vec::new(),
        }
    }

    pub fn create(text: impl Into<String>) -> Self {
        Self::new(NoteVerb::Create).with("text", text)
    }

    pub fn open_by_id(id: impl Into<String>) -> Self {
        Self::new(NoteVerb::OpenNote).with("id", id)
    }

    pub fn open_by_title(title: impl Into<String>) -> Self {
        Self::new(NoteVerb::OpenNote).with("title", title)
    }

    /// Replaces the whole body of note `id`.
    pub fn replace_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoteVerb::AddText)
            .with("id", id)
            .with("mode", "replace_all")
            .with("text", text)
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self::new(NoteVerb::Search).with("term", term)
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.with("title", title)
    }

    pub fn tags<S: AsRef<str>>(self, tags: &[S]) -> Self {
        let joined = tags
            .iter()
            .map(|tag| tag.as_ref().trim())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            return self;
        }
        self.with("tags", joined)
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.with("tag", tag)
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        self.with("token", token)
    }

    pub fn open_note(self, yes: bool) -> Self {
        self.with("open_note", yes_no(yes))
    }

    pub fn show_window(self, yes: bool) -> Self {
        self.with("show_window", yes_no(yes))
    }

    pub fn new_window(self, yes: bool) -> Self {
        self.with("new_window", yes_no(yes))
    }

    pub fn exclude_trashed(self, yes: bool) -> Self {
        self.with("exclude_trashed", yes_no(yes))
    }

    /// Open the note without bringing Bear forward.
    pub fn in_background(self) -> Self {
        self.open_note(false).show_window(false)
    }

    pub fn on_success(self, callback: impl Into<String>) -> Self {
        self.with("x-success", callback)
    }

    pub fn on_error(self, callback: impl Into<String>) -> Self {
        self.with("x-error", callback)
    }

    pub fn verb(&self) -> NoteVerb {
        self.verb
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_url(&self) -> String {
        let query = build_query(
            self.params
                .iter()
                .map(|(key, value)| (*key, Cow::Borrowed(value.as_str()))),
        );
        if query.is_empty() {
            format!("{BEAR_URL_BASE}/{}", self.verb)
        } else {
            format!("{BEAR_URL_BASE}/{}?{query}", self.verb)
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
