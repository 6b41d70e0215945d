//! Timeouts and tolerances read from the process environment
//!
//! Every value has a default. A variable that is missing, empty, not a
//! number, zero or negative leaves the default in place; a bad value is
//! logged but never fails startup.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Why an environment value was ignored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} is empty")]
    Empty { name: &'static str },
    #[error("{name}={value:?} is not a whole number of milliseconds")]
    NotANumber { name: &'static str, value: String },
    #[error("{name}={value} must be greater than zero")]
    NotPositive { name: &'static str, value: i64 },
}

/// Parses a positive millisecond count
pub fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    let value: i64 = trimmed.parse().map_err(|_| ConfigError::NotANumber {
        name,
        value: raw.to_string(),
    })?;
    if value <= 0 {
        return Err(ConfigError::NotPositive { name, value });
    }
    Ok(Duration::from_millis(value as u64))
}

fn millis_or<F>(lookup: &F, name: &'static str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => default,
        Some(raw) => parse_millis(name, &raw).unwrap_or_else(|e| {
            warn!(error = %e, default_ms = default.as_millis() as u64, "using default");
            default
        }),
    }
}

fn from_process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Settings for mouse operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseConfiguration {
    /// Upper bound for waiting on the injection lock
    pub timeout: Duration,
    /// Per-axis pixel distance at which the cursor counts as arrived
    pub position_tolerance: u32,
    /// How long the cursor read-back keeps polling
    pub verify_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause between pressing the button and moving during a drag
    pub drag_settle: Duration,
}

impl MouseConfiguration {
    pub const TIMEOUT_ENV: &'static str = "MCP_MOUSE_TIMEOUT_MS";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

    pub fn from_env() -> Self {
        Self::from_lookup(from_process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            timeout: millis_or(&lookup, Self::TIMEOUT_ENV, Self::DEFAULT_TIMEOUT),
            ..Self::default()
        }
    }
}

impl Default for MouseConfiguration {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            position_tolerance: 1,
            verify_timeout: Duration::from_millis(250),
            poll_interval: Duration::from_millis(10),
            drag_settle: Duration::from_millis(50),
        }
    }
}

/// Settings for window operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfiguration {
    pub operation_timeout: Duration,
    /// Budget for waiting on a window to appear
    pub wait_for_timeout: Duration,
    /// Budget for a single property read-back, including each activation check
    pub property_query_timeout: Duration,
    /// Budget for the whole activation ladder
    pub activation_timeout: Duration,
}

impl WindowConfiguration {
    pub const OPERATION_TIMEOUT_ENV: &'static str = "MCP_WINDOW_TIMEOUT_MS";
    pub const WAIT_FOR_TIMEOUT_ENV: &'static str = "MCP_WINDOW_WAITFOR_TIMEOUT_MS";
    pub const PROPERTY_TIMEOUT_ENV: &'static str = "MCP_WINDOW_PROPERTY_TIMEOUT_MS";
    pub const ACTIVATION_TIMEOUT_ENV: &'static str = "MCP_WINDOW_ACTIVATION_TIMEOUT_MS";

    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(5000);
    pub const DEFAULT_WAIT_FOR_TIMEOUT: Duration = Duration::from_millis(30_000);
    pub const DEFAULT_PROPERTY_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn from_env() -> Self {
        Self::from_lookup(from_process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let operation_timeout = millis_or(
            &lookup,
            Self::OPERATION_TIMEOUT_ENV,
            Self::DEFAULT_OPERATION_TIMEOUT,
        );
        Self {
            operation_timeout,
            wait_for_timeout: millis_or(
                &lookup,
                Self::WAIT_FOR_TIMEOUT_ENV,
                Self::DEFAULT_WAIT_FOR_TIMEOUT,
            ),
            property_query_timeout: millis_or(
                &lookup,
                Self::PROPERTY_TIMEOUT_ENV,
                Self::DEFAULT_PROPERTY_TIMEOUT,
            ),
            // Follows the operation timeout unless set on its own
            activation_timeout: millis_or(&lookup, Self::ACTIVATION_TIMEOUT_ENV, operation_timeout),
        }
    }
}

impl Default for WindowConfiguration {
    fn default() -> Self {
        Self {
            operation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
            wait_for_timeout: Self::DEFAULT_WAIT_FOR_TIMEOUT,
            property_query_timeout: Self::DEFAULT_PROPERTY_TIMEOUT,
            activation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
        }
    }
}
