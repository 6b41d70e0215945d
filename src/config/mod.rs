//! Runtime configuration
//!
//! Values are read once when the services are built and then passed in by
//! value. Nothing here is reloaded while an operation runs.

pub mod timeouts;

pub use timeouts::{ConfigError, MouseConfiguration, WindowConfiguration};
