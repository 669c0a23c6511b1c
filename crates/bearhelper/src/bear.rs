//! Bear x-callback-url plumbing: outbound actions, inbound callbacks and the
//! percent-encoding shared by both.

pub mod action;
pub mod callback;
pub mod encoding;

pub use action::{NoteAction, NoteVerb, BEAR_URL_BASE};
pub use callback::{CallbackAction, InboundCallback, CALLBACK_SCHEME, REQUEST_ID_PARAM};
pub use encoding::{decode, encode};
