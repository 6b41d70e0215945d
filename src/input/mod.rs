//! Input synthesis
//!
//! Everything that puts events into the OS input stream lives here and
//! serializes through one process-wide lock, because interleaved batches from
//! two operations corrupt the cursor and button sequence.

use std::sync::{Arc, OnceLock};

use tokio::sync::Mutex;

pub mod modifiers;
pub mod mouse;
pub mod normalizer;

pub use modifiers::{HeldModifiers, ModifierKeys};
pub use mouse::{HeldButton, MouseInputService};
pub use normalizer::{CoordinateNormalizer, normalize};

static INJECTION_LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();

/// The lock every input-synthesis sequence in this process holds
pub fn injection_lock() -> Arc<Mutex<()>> {
    INJECTION_LOCK
        .get_or_init(|| Arc::new(Mutex::new(())))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injection_lock_is_shared() {
        assert!(Arc::ptr_eq(&injection_lock(), &injection_lock()));
    }
}
