pub mod bear;
pub mod calendar;
pub mod command;
pub mod context;
pub mod dates;
pub mod dispatch;
pub mod error;
pub mod pending;
pub mod platform;
pub mod routing;
pub mod settings;
pub mod template;
pub mod utils;
pub mod workflow;

pub use crate::context::HelperContext;
pub use crate::error::{HelperError, HelperResult};
pub use crate::routing::{CallbackRouter, RouteOutcome};
pub use crate::settings::Settings;
pub use crate::workflow::NoteWorkflows;
