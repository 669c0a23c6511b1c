//! Line-oriented commands accepted by the helper binary.

pub mod parser;
pub mod runner;
pub mod types;

pub use parser::parse;
pub use runner::{execute, serve, SHUTDOWN_GRACE};
pub use types::HelperCommand;
