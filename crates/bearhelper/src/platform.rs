mod adapters;
pub mod factory;
pub mod launch_agent;

pub use adapters::recording::RecordingPlatform;
pub use adapters::{Platform, SharedPlatform};
pub use factory::default_platform;
