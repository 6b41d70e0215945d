//! Foreground window activation
//!
//! Windows refuses most foreground changes requested by a background
//! process, and `SetForegroundWindow` reports success even when it quietly
//! flashes the taskbar button instead. Activation therefore walks an ordered
//! ladder of workarounds and trusts nothing but a read-back of the actual
//! foreground window after each step.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WindowConfiguration;
use crate::domain::{MouseErrorCode, WindowHandle};
use crate::platform::ForegroundAccess;

/// Interval between foreground read-backs
const FOREGROUND_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One rung of the activation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStep {
    /// Restore if minimized, then request the foreground
    Direct,
    /// Share the target thread's input queue while requesting the foreground
    AttachThreadInput,
    /// Minimize and restore to make the shell hand over the foreground
    MinimizeRestore,
}

/// Result of an activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "step", rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// The window was already in front; no step ran
    AlreadyForeground,
    Activated(ActivationStep),
    /// Null handle, or the window no longer exists
    InvalidHandle,
    /// Every permitted step ran and none took effect
    Exhausted,
    /// The ladder ran out of its time budget
    TimedOut,
    Cancelled,
}

impl ActivationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActivationOutcome::AlreadyForeground | ActivationOutcome::Activated(_)
        )
    }

    pub fn error_code(&self) -> MouseErrorCode {
        match self {
            ActivationOutcome::AlreadyForeground | ActivationOutcome::Activated(_) => {
                MouseErrorCode::Success
            }
            ActivationOutcome::InvalidHandle | ActivationOutcome::Exhausted => {
                MouseErrorCode::ActivationFailed
            }
            ActivationOutcome::TimedOut | ActivationOutcome::Cancelled => MouseErrorCode::Timeout,
        }
    }
}

/// Brings windows to the foreground
#[async_trait]
pub trait WindowActivator: Send + Sync {
    /// Activates `window`, trying the fallback steps too when `use_fallback` is set
    ///
    /// Cancellation is observed between steps only.
    async fn activate_window(
        &self,
        window: WindowHandle,
        use_fallback: bool,
        cancel: &CancellationToken,
    ) -> ActivationOutcome;

    /// Single read-back of the foreground window
    fn is_foreground_window(&self, window: WindowHandle) -> bool;

    /// Current foreground window; null during transitions
    fn foreground_window(&self) -> WindowHandle;
}

/// A ladder rung as data
pub struct ActivationStrategy {
    pub step: ActivationStep,
    /// Only tried when the caller allows fallbacks
    pub fallback_only: bool,
    pub attempt: fn(&dyn ForegroundAccess, WindowHandle),
}

/// Ordered ladder, first verified success wins
pub const ACTIVATION_LADDER: &[ActivationStrategy] = &[
    ActivationStrategy {
        step: ActivationStep::Direct,
        fallback_only: false,
        attempt: attempt_direct,
    },
    ActivationStrategy {
        step: ActivationStep::AttachThreadInput,
        fallback_only: true,
        attempt: attempt_attach_thread_input,
    },
    ActivationStrategy {
        step: ActivationStep::MinimizeRestore,
        fallback_only: true,
        attempt: attempt_minimize_restore,
    },
];

fn attempt_direct(windows: &dyn ForegroundAccess, window: WindowHandle) {
    if windows.is_minimized(window) {
        windows.restore(window);
    }
    windows.set_foreground(window);
}

fn attempt_attach_thread_input(windows: &dyn ForegroundAccess, window: WindowHandle) {
    let Some(target_thread) = windows.window_thread_id(window) else {
        debug!(%window, "no owning thread, skipping input attachment");
        return;
    };
    let _attachment =
        ThreadInputAttachment::attach(windows, windows.current_thread_id(), target_thread);
    windows.bring_to_top(window);
    windows.set_foreground(window);
}

fn attempt_minimize_restore(windows: &dyn ForegroundAccess, window: WindowHandle) {
    windows.minimize(window);
    windows.restore(window);
    windows.set_foreground(window);
}

/// Input queue attachment between two threads, detached on drop
///
/// An attachment left in place merges the two threads' focus and key state
/// until one of them exits.
pub struct ThreadInputAttachment<'a> {
    windows: &'a dyn ForegroundAccess,
    from: u32,
    to: u32,
    attached: bool,
}

impl<'a> ThreadInputAttachment<'a> {
    pub fn attach(windows: &'a dyn ForegroundAccess, from: u32, to: u32) -> Self {
        // A thread cannot attach to itself
        let attached = from != to && windows.attach_thread_input(from, to, true);
        if from != to && !attached {
            warn!(from, to, "AttachThreadInput refused");
        }
        Self {
            windows,
            from,
            to,
            attached,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Drop for ThreadInputAttachment<'_> {
    fn drop(&mut self) {
        if self.attached && !self.windows.attach_thread_input(self.from, self.to, false) {
            warn!(from = self.from, to = self.to, "failed to detach thread input");
        }
    }
}

/// Ladder-based activator over the live foreground state
pub struct ForegroundActivator {
    windows: Arc<dyn ForegroundAccess>,
    config: WindowConfiguration,
}

impl ForegroundActivator {
    pub fn new(windows: Arc<dyn ForegroundAccess>, config: WindowConfiguration) -> Self {
        Self { windows, config }
    }

    async fn run_ladder(
        &self,
        window: WindowHandle,
        use_fallback: bool,
        cancel: &CancellationToken,
    ) -> ActivationOutcome {
        let steps = ACTIVATION_LADDER
            .iter()
            .filter(|strategy| use_fallback || !strategy.fallback_only);

        for strategy in steps {
            if cancel.is_cancelled() {
                info!(%window, "activation cancelled");
                return ActivationOutcome::Cancelled;
            }

            debug!(%window, step = ?strategy.step, "trying activation step");
            (strategy.attempt)(self.windows.as_ref(), window);

            if self.wait_for_foreground(window).await {
                info!(%window, step = ?strategy.step, "window activated");
                return ActivationOutcome::Activated(strategy.step);
            }
            debug!(%window, step = ?strategy.step, "step did not take effect");
        }

        warn!(%window, use_fallback, "activation ladder exhausted");
        ActivationOutcome::Exhausted
    }

    /// Polls until `window` is in front or the read-back budget runs out
    async fn wait_for_foreground(&self, window: WindowHandle) -> bool {
        let deadline = Instant::now() + self.config.property_query_timeout;
        loop {
            if self.is_foreground_window(window) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(FOREGROUND_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl WindowActivator for ForegroundActivator {
    async fn activate_window(
        &self,
        window: WindowHandle,
        use_fallback: bool,
        cancel: &CancellationToken,
    ) -> ActivationOutcome {
        if window.is_null() || !self.windows.is_window(window) {
            debug!(%window, "not a window");
            return ActivationOutcome::InvalidHandle;
        }
        if self.is_foreground_window(window) {
            debug!(%window, "already foreground");
            return ActivationOutcome::AlreadyForeground;
        }

        let budget = self.config.activation_timeout;
        match timeout(budget, self.run_ladder(window, use_fallback, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(%window, budget_ms = budget.as_millis() as u64, "activation timed out");
                ActivationOutcome::TimedOut
            }
        }
    }

    fn is_foreground_window(&self, window: WindowHandle) -> bool {
        !window.is_null() && self.windows.foreground_window() == window
    }

    fn foreground_window(&self) -> WindowHandle {
        self.windows.foreground_window()
    }
}
