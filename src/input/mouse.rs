//! Mouse operation pipeline
//!
//! Every operation runs the same sequence:
//! resolve target -> safety gate -> validate -> normalize -> take the
//! injection lock -> hold modifiers -> inject -> verify cursor -> release.
//!
//! CRITICAL: Nothing is synthesized before the gate and the bounds check have
//! passed. Once a key or button is down, cancellation is no longer observed
//! and the matching key-up/button-up always goes out, including when the
//! operation future is dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::modifiers::ModifierKeys;
use super::normalizer::{CoordinateNormalizer, normalize};
use crate::config::MouseConfiguration;
use crate::domain::{
    ModifierSet, MouseButton, MouseControlResult, MouseErrorCode, NormalizedPoint, PositionCheck,
    ScreenBounds, ScreenPoint, ScrollDirection, WheelOrientation,
};
use crate::error::{PlatformError, PlatformResult};
use crate::platform::{InputEvent, InputInjector, KeyboardState, ScreenQuery};
use crate::safety::SafetyGate;

/// Early exit of a pipeline stage, already shaped as the final result
type Stage<T> = Result<T, MouseControlResult>;

/// What gets injected at the normalized target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Move,
    Click { button: MouseButton, count: u8 },
    Scroll { orientation: WheelOrientation, delta: i32 },
}

impl Gesture {
    fn name(&self) -> &'static str {
        match self {
            Gesture::Move => "move",
            Gesture::Click { count: 2, .. } => "double_click",
            Gesture::Click {
                button: MouseButton::Right,
                ..
            } => "right_click",
            Gesture::Click {
                button: MouseButton::Middle,
                ..
            } => "middle_click",
            Gesture::Click { .. } => "click",
            Gesture::Scroll { .. } => "scroll",
        }
    }

    /// The whole gesture as one uninterrupted batch
    fn events(&self, at: NormalizedPoint) -> Vec<InputEvent> {
        let mut events = vec![InputEvent::MoveAbsolute(at)];
        match *self {
            Gesture::Move => {}
            Gesture::Click { button, count } => {
                for _ in 0..count {
                    events.push(InputEvent::ButtonDown(button));
                    events.push(InputEvent::ButtonUp(button));
                }
            }
            Gesture::Scroll { orientation, delta } => {
                events.push(InputEvent::Wheel { orientation, delta });
            }
        }
        events
    }
}

fn cancelled() -> MouseControlResult {
    MouseControlResult::failed(MouseErrorCode::Timeout, "Operation was cancelled")
}

fn check_cancelled(cancel: &CancellationToken) -> Stage<()> {
    if cancel.is_cancelled() {
        info!("mouse operation cancelled before any input was synthesized");
        return Err(cancelled());
    }
    Ok(())
}

fn system_error(context: &str, error: PlatformError) -> MouseControlResult {
    MouseControlResult::failed(MouseErrorCode::SystemError, format!("{context}: {error}"))
}

/// A mouse button this operation pressed, released exactly once
///
/// Drop sends the button-up if [`HeldButton::release`] was never reached.
#[must_use = "dropping the guard releases the button immediately"]
pub struct HeldButton<'a> {
    injector: &'a dyn InputInjector,
    button: MouseButton,
    released: bool,
}

impl<'a> HeldButton<'a> {
    /// Takes ownership of a button whose button-down was already accepted
    pub fn new(injector: &'a dyn InputInjector, button: MouseButton) -> Self {
        Self {
            injector,
            button,
            released: false,
        }
    }

    pub fn release(mut self) -> PlatformResult<()> {
        self.release_now()
    }

    fn release_now(&mut self) -> PlatformResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match self.injector.send(&[InputEvent::ButtonUp(self.button)])? {
            1 => Ok(()),
            accepted => Err(PlatformError::InjectionRejected {
                requested: 1,
                accepted,
            }),
        }
    }
}

impl Drop for HeldButton<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release_now() {
            warn!(button = ?self.button, error = %e, "mouse button may still be held");
        }
    }
}

/// Mouse operations against the live desktop
pub struct MouseInputService {
    injector: Arc<dyn InputInjector>,
    screen: Arc<dyn ScreenQuery>,
    normalizer: CoordinateNormalizer,
    modifiers: ModifierKeys,
    gate: SafetyGate,
    config: MouseConfiguration,
    lock: Arc<Mutex<()>>,
}

impl MouseInputService {
    pub fn new(
        injector: Arc<dyn InputInjector>,
        screen: Arc<dyn ScreenQuery>,
        keyboard: Arc<dyn KeyboardState>,
        gate: SafetyGate,
        config: MouseConfiguration,
    ) -> Self {
        Self {
            normalizer: CoordinateNormalizer::new(screen.clone()),
            modifiers: ModifierKeys::new(injector.clone(), keyboard),
            injector,
            screen,
            gate,
            config,
            lock: super::injection_lock(),
        }
    }

    /// Serializes against `lock` instead of the process-wide injection lock
    pub fn with_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.lock = lock;
        self
    }

    pub fn config(&self) -> &MouseConfiguration {
        &self.config
    }

    /// Moves the cursor to (`x`, `y`)
    ///
    /// Moves go through the safety gate as well, so hovering over an elevated
    /// window is refused the same way a click would be.
    pub async fn move_to(&self, x: i32, y: i32, cancel: &CancellationToken) -> MouseControlResult {
        self.perform(Some(x), Some(y), ModifierSet::NONE, Gesture::Move, cancel)
            .await
    }

    /// Left click at the given point, or at the cursor for a missing axis
    pub async fn click(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        modifiers: ModifierSet,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let gesture = Gesture::Click {
            button: MouseButton::Left,
            count: 1,
        };
        self.perform(x, y, modifiers, gesture, cancel).await
    }

    pub async fn double_click(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        modifiers: ModifierSet,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let gesture = Gesture::Click {
            button: MouseButton::Left,
            count: 2,
        };
        self.perform(x, y, modifiers, gesture, cancel).await
    }

    pub async fn right_click(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        modifiers: ModifierSet,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let gesture = Gesture::Click {
            button: MouseButton::Right,
            count: 1,
        };
        self.perform(x, y, modifiers, gesture, cancel).await
    }

    pub async fn middle_click(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let gesture = Gesture::Click {
            button: MouseButton::Middle,
            count: 1,
        };
        self.perform(x, y, ModifierSet::NONE, gesture, cancel).await
    }

    /// Presses `button` at `start`, moves to `end` and releases there
    ///
    /// Both endpoints are gated and validated before anything is sent.
    pub async fn drag(
        &self,
        start: ScreenPoint,
        end: ScreenPoint,
        button: MouseButton,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let result = self
            .drag_stages(start, end, button, cancel)
            .await
            .unwrap_or_else(|failure| failure);
        log_outcome("drag", &result);
        result
    }

    /// Scrolls `amount` notches in `direction` at the given point or the cursor
    pub async fn scroll(
        &self,
        direction: ScrollDirection,
        amount: u32,
        x: Option<i32>,
        y: Option<i32>,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let gesture = Gesture::Scroll {
            orientation: direction.orientation(),
            delta: direction.wheel_delta(amount),
        };
        self.perform(x, y, ModifierSet::NONE, gesture, cancel).await
    }

    async fn perform(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        modifiers: ModifierSet,
        gesture: Gesture,
        cancel: &CancellationToken,
    ) -> MouseControlResult {
        let result = self
            .gesture_stages(x, y, modifiers, gesture, cancel)
            .await
            .unwrap_or_else(|failure| failure);
        log_outcome(gesture.name(), &result);
        result
    }

    async fn gesture_stages(
        &self,
        x: Option<i32>,
        y: Option<i32>,
        modifiers: ModifierSet,
        gesture: Gesture,
        cancel: &CancellationToken,
    ) -> Stage<MouseControlResult> {
        let target = self.resolve_target(x, y)?;
        check_cancelled(cancel)?;

        let bounds = self.admit(&[target])?;
        let normalized = normalize(target, bounds);
        debug!(%target, ?normalized, "normalized target");
        check_cancelled(cancel)?;

        let _queue = self.acquire_lock(cancel).await?;
        check_cancelled(cancel)?;

        let held = self.modifiers.hold(modifiers);
        let missing = self.modifiers.missing(modifiers);
        if !missing.is_empty() {
            warn!(?missing, "modifier key-down rejected, not injecting");
            held.release();
            return Err(MouseControlResult::failed(
                MouseErrorCode::SystemError,
                format!("Failed to press modifier keys {missing:?}"),
            ));
        }

        let outcome = match self.inject(&gesture.events(normalized)) {
            Ok(()) => self.verify_position(target).await,
            Err(failure) => Err(failure),
        };
        held.release();

        Ok(MouseControlResult::succeeded(target, outcome?))
    }

    async fn drag_stages(
        &self,
        start: ScreenPoint,
        end: ScreenPoint,
        button: MouseButton,
        cancel: &CancellationToken,
    ) -> Stage<MouseControlResult> {
        check_cancelled(cancel)?;

        let bounds = self.admit(&[start, end])?;
        let from = normalize(start, bounds);
        let to = normalize(end, bounds);
        debug!(%start, %end, ?from, ?to, ?button, "normalized drag");
        check_cancelled(cancel)?;

        let _queue = self.acquire_lock(cancel).await?;
        check_cancelled(cancel)?;

        self.inject(&[InputEvent::MoveAbsolute(from), InputEvent::ButtonDown(button)])?;
        let pressed = HeldButton::new(self.injector.as_ref(), button);

        // Give the target time to register the press before the pointer moves
        sleep(self.config.drag_settle).await;
        let moved = self.inject(&[InputEvent::MoveAbsolute(to)]);
        let released = pressed.release();

        moved?;
        released.map_err(|e| system_error("Failed to release mouse button", e))?;

        let check = self.verify_position(end).await?;
        Ok(MouseControlResult::succeeded(end, check))
    }

    /// Fills a missing axis from the live cursor position
    fn resolve_target(&self, x: Option<i32>, y: Option<i32>) -> Stage<ScreenPoint> {
        if let (Some(x), Some(y)) = (x, y) {
            return Ok(ScreenPoint::new(x, y));
        }
        let cursor = self
            .screen
            .cursor_position()
            .map_err(|e| system_error("Failed to read cursor position", e))?;
        Ok(ScreenPoint::new(x.unwrap_or(cursor.x), y.unwrap_or(cursor.y)))
    }

    /// Runs the safety gate, then the bounds check, for every target
    fn admit(&self, targets: &[ScreenPoint]) -> Stage<ScreenBounds> {
        self.gate.check(targets).map_err(|violation| {
            MouseControlResult::failed(violation.error_code(), violation.to_string())
        })?;

        let mut admitted = None;
        for &point in targets {
            let (valid, bounds) = self
                .normalizer
                .validate(point)
                .map_err(|e| system_error("Failed to query virtual screen bounds", e))?;
            if !valid {
                info!(%point, %bounds, "coordinates outside the virtual desktop");
                return Err(MouseControlResult::failed(
                    MouseErrorCode::InvalidCoordinates,
                    format!("Coordinates {point} are outside the virtual screen bounds {bounds}"),
                )
                .with_bounds(bounds)
                .with_requested(point));
            }
            admitted = Some(bounds);
        }

        admitted.ok_or_else(|| {
            MouseControlResult::failed(MouseErrorCode::SystemError, "No target coordinates")
        })
    }

    /// Waits for the injection lock, bounded by the timeout and the token
    async fn acquire_lock(&self, cancel: &CancellationToken) -> Stage<MutexGuard<'_, ()>> {
        let budget = self.config.timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("mouse operation cancelled while waiting for the input queue");
                Err(cancelled())
            }
            acquired = timeout(budget, self.lock.lock()) => acquired.map_err(|_| {
                warn!(timeout_ms = budget.as_millis() as u64, "input queue busy");
                MouseControlResult::failed(
                    MouseErrorCode::Timeout,
                    format!(
                        "Timed out after {} ms waiting for another input operation",
                        budget.as_millis()
                    ),
                )
            }),
        }
    }

    fn inject(&self, events: &[InputEvent]) -> Stage<()> {
        let accepted = self
            .injector
            .send(events)
            .map_err(|e| system_error("Input injection failed", e))?;
        if accepted == events.len() {
            debug!(events = accepted, "input injected");
            return Ok(());
        }

        warn!(accepted, requested = events.len(), "input batch partially rejected");
        self.release_unmatched_buttons(&events[..accepted]);
        Err(system_error(
            "Input injection failed",
            PlatformError::InjectionRejected {
                requested: events.len(),
                accepted,
            },
        ))
    }

    /// Sends button-up for every button-down in `sent` that has no partner
    fn release_unmatched_buttons(&self, sent: &[InputEvent]) {
        let mut down: Vec<MouseButton> = Vec::new();
        for event in sent {
            match event {
                InputEvent::ButtonDown(button) => down.push(*button),
                InputEvent::ButtonUp(button) => {
                    if let Some(i) = down.iter().rposition(|d| d == button) {
                        down.remove(i);
                    }
                }
                _ => {}
            }
        }
        if down.is_empty() {
            return;
        }

        let ups: Vec<InputEvent> = down.iter().rev().map(|b| InputEvent::ButtonUp(*b)).collect();
        if !matches!(self.injector.send(&ups), Ok(n) if n == ups.len()) {
            warn!(?down, "mouse button may still be held");
        }
    }

    /// Polls the cursor until it reaches `expected` or the budget runs out
    ///
    /// A cursor that never arrives is reported, not treated as a failure.
    async fn verify_position(&self, expected: ScreenPoint) -> Stage<PositionCheck> {
        let tolerance = self.config.position_tolerance;
        let deadline = Instant::now() + self.config.verify_timeout;
        loop {
            let actual = self
                .screen
                .cursor_position()
                .map_err(|e| system_error("Failed to read cursor position", e))?;
            let delta = actual.delta_from(expected);

            if actual.is_near(expected, tolerance) {
                debug!(%expected, %actual, ?delta, "cursor position verified");
                return Ok(PositionCheck {
                    actual,
                    delta,
                    verified: true,
                });
            }
            if Instant::now() >= deadline {
                warn!(%expected, %actual, ?delta, "cursor did not reach requested position");
                return Ok(PositionCheck {
                    actual,
                    delta,
                    verified: false,
                });
            }
            sleep(self.config.poll_interval).await;
        }
    }
}

fn log_outcome(operation: &str, result: &MouseControlResult) {
    if result.success() {
        debug!(operation, verified = result.position_verified(), "mouse operation completed");
    } else {
        info!(
            operation,
            code = %result.error_code(),
            error = result.error().unwrap_or_default(),
            "mouse operation failed"
        );
    }
}
