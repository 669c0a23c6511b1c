use std::fmt;

use crate::bear::{CallbackAction, InboundCallback, REQUEST_ID_PARAM};
use crate::pending::{resolve_lookup, Continuation, LookupOutcome};
use crate::workflow::NoteWorkflows;

/// Why an inbound URL was not acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    NotOurScheme,
    UnknownAction(String),
    MissingParameter {
        action: CallbackAction,
        name: &'static str,
    },
    /// No pending request with this id expects this callback.
    UnknownRequest(CallbackAction),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotOurScheme => write!(f, "not a callback URL"),
            IgnoreReason::UnknownAction(host) => write!(f, "unknown callback '{host}'"),
            IgnoreReason::MissingParameter { action, name } => {
                write!(f, "callback {action} is missing '{name}'")
            }
            IgnoreReason::UnknownRequest(action) => {
                write!(f, "callback {action} does not match a pending request")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Dispatched(CallbackAction),
    Ignored(IgnoreReason),
}

/// Dispatches inbound callback URLs by host.
///
/// Parameters are checked before any pending request is consumed, so an
/// ignored URL never changes state.
#[derive(Clone)]
pub struct CallbackRouter {
    workflows: NoteWorkflows,
}

impl CallbackRouter {
    pub fn new(workflows: NoteWorkflows) -> Self {
        Self { workflows }
    }

    pub fn workflows(&self) -> &NoteWorkflows {
        &self.workflows
    }

    pub async fn route(&self, url: &str) -> RouteOutcome {
        let outcome = self.route_inner(url).await;
        match &outcome {
            RouteOutcome::Dispatched(action) => tracing::debug!("handled callback {action}"),
            RouteOutcome::Ignored(reason @ IgnoreReason::NotOurScheme)
            | RouteOutcome::Ignored(reason @ IgnoreReason::UnknownAction(_)) => {
                tracing::debug!("ignoring inbound URL: {reason}")
            }
            RouteOutcome::Ignored(reason) => tracing::warn!("ignoring inbound URL: {reason}"),
        }
        outcome
    }

    async fn route_inner(&self, url: &str) -> RouteOutcome {
        let Some(inbound) = InboundCallback::parse(url) else {
            return RouteOutcome::Ignored(IgnoreReason::NotOurScheme);
        };
        let Some(action) = inbound.action() else {
            return RouteOutcome::Ignored(IgnoreReason::UnknownAction(inbound.host));
        };
        if let Some(name) = inbound.missing_param(action) {
            return RouteOutcome::Ignored(IgnoreReason::MissingParameter { action, name });
        }

        if action.is_entry_point() {
            self.run_entry_point(action, &inbound).await;
            return RouteOutcome::Dispatched(action);
        }

        let Some(request_id) = inbound.request_id() else {
            return RouteOutcome::Ignored(IgnoreReason::MissingParameter {
                action,
                name: REQUEST_ID_PARAM,
            });
        };
        let Some(continuation) = self.workflows.context().pending().take(request_id, action)
        else {
            return RouteOutcome::Ignored(IgnoreReason::UnknownRequest(action));
        };

        self.resume(action, continuation, &inbound).await;
        RouteOutcome::Dispatched(action)
    }

    async fn run_entry_point(&self, action: CallbackAction, inbound: &InboundCallback) {
        match action {
            CallbackAction::SyncNote => self.workflows.sync_note_by_id(value(inbound, "id")).await,
            CallbackAction::OpenDailyNoteForDate => {
                self.workflows
                    .open_daily_note(Some(value(inbound, "date")))
                    .await
            }
            CallbackAction::CreateDailyNoteForDate => {
                self.workflows
                    .create_daily_note(Some(value(inbound, "date")))
                    .await
            }
            other => tracing::warn!("{other} is not an entry point"),
        }
    }

    async fn resume(
        &self,
        action: CallbackAction,
        continuation: Continuation,
        inbound: &InboundCallback,
    ) {
        match continuation {
            Continuation::UpdateHomeNote => {
                if action == CallbackAction::UpdateHomeNoteSuccess {
                    self.workflows.apply_home_note(value(inbound, "note")).await;
                } else {
                    tracing::warn!("home note could not be fetched: {}", error_message(inbound));
                }
            }
            Continuation::UpdateDailyNote => {
                if action == CallbackAction::UpdateDailyNoteError {
                    tracing::info!("daily note not found: {}", error_message(inbound));
                    return;
                }
                self.workflows
                    .apply_daily_note(
                        value(inbound, "title"),
                        value(inbound, "note"),
                        value(inbound, "identifier"),
                        action == CallbackAction::UpdateDailyNoteSuccess,
                    )
                    .await;
            }
            Continuation::OpenDailyNote { date } => {
                if action == CallbackAction::OpenDailyNoteSuccess {
                    self.workflows.open_note(value(inbound, "identifier"));
                } else {
                    // One fallback only: the created note is not looked up again.
                    self.workflows.create_daily_note(Some(&date)).await;
                }
            }
            Continuation::ReplaceSyncPlaceholder => {
                self.workflows
                    .fetch_created_note(value(inbound, "identifier"));
            }
            Continuation::ReplaceSyncPlaceholderAction => {
                self.workflows
                    .apply_daily_note(
                        value(inbound, "title"),
                        value(inbound, "note"),
                        value(inbound, "identifier"),
                        true,
                    )
                    .await;
            }
            Continuation::Lookup { title, responder } => {
                let outcome = if action == CallbackAction::LookupNoteSuccess {
                    resolve_lookup(&title, value(inbound, "notes"))
                } else {
                    tracing::info!("lookup for '{title}' failed: {}", error_message(inbound));
                    LookupOutcome::Empty
                };
                if responder.send(outcome).is_err() {
                    tracing::debug!("lookup for '{title}' answered after its waiter left");
                }
            }
        }
    }
}

fn value<'a>(inbound: &'a InboundCallback, name: &str) -> &'a str {
    inbound.param(name).unwrap_or_default()
}

fn error_message(inbound: &InboundCallback) -> &str {
    inbound
        .param("errorMessage")
        .or_else(|| inbound.param("error"))
        .unwrap_or("no details")
}
