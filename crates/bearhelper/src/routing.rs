//! Inbound callback routing: maps `fodabear://` URLs to note workflows.

pub mod router;

pub use router::{CallbackRouter, IgnoreReason, RouteOutcome};
