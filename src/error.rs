//! Platform-level error types
//!
//! These represent genuinely unexpected OS failures. Expected conditions
//! (blocked targets, out-of-bounds points) never travel as errors; they are
//! reported through [`crate::domain::MouseErrorCode`].

use thiserror::Error;

/// Errors raised by the platform capability layer
#[derive(Debug, Error)]
pub enum PlatformError {
    #[cfg(windows)]
    #[error("{operation} failed: {source}")]
    Win32 {
        operation: &'static str,
        #[source]
        source: windows::core::Error,
    },
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("input injection rejected: {accepted} of {requested} events accepted")]
    InjectionRejected { requested: usize, accepted: usize },
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("not supported on this platform")]
    Unsupported,
}

impl PlatformError {
    /// Returns true if the OS refused access rather than failing outright
    pub fn is_access_denied(&self) -> bool {
        match self {
            PlatformError::AccessDenied(_) => true,
            #[cfg(windows)]
            PlatformError::Win32 { source, .. } => {
                source.code() == windows::Win32::Foundation::E_ACCESSDENIED
            }
            _ => false,
        }
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
