//! Modifier key press/release bookkeeping
//!
//! An operation may ask for Ctrl, Shift or Alt to be held while it clicks.
//! Only keys the user is not already holding get synthesized, and exactly
//! those keys are released again afterwards.
//!
//! CRITICAL: A synthesized key-down that is never released stays down
//! system-wide until the user taps that key. Always hold modifiers through
//! [`ModifierKeys::hold`] so the release runs on every exit path, including
//! cancellation and a dropped future.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{ModifierSet, VirtualKey};
use crate::platform::{InputEvent, InputInjector, KeyboardState};

/// Presses and releases modifier keys without disturbing user-held keys
#[derive(Clone)]
pub struct ModifierKeys {
    injector: Arc<dyn InputInjector>,
    keyboard: Arc<dyn KeyboardState>,
}

impl ModifierKeys {
    pub fn new(injector: Arc<dyn InputInjector>, keyboard: Arc<dyn KeyboardState>) -> Self {
        Self { injector, keyboard }
    }

    /// Live key state query
    pub fn is_key_pressed(&self, key: VirtualKey) -> bool {
        self.keyboard.is_key_down(key)
    }

    /// Presses every requested modifier that is not already down
    ///
    /// # Returns
    /// The keys this call pressed itself, in press order. Keys the user was
    /// already holding are left alone and are not part of the list. A key
    /// whose key-down the OS rejected is not part of the list either.
    pub fn press_modifiers(&self, modifiers: ModifierSet) -> Vec<VirtualKey> {
        let mut owned = Vec::new();

        for key in modifiers.keys() {
            if self.is_key_pressed(key) {
                debug!(?key, "modifier already held by user, leaving it alone");
                continue;
            }

            match self.injector.send(&[InputEvent::KeyDown(key)]) {
                Ok(1) => owned.push(key),
                Ok(_) => warn!(?key, "key-down rejected by the OS"),
                Err(e) => warn!(?key, error = %e, "failed to synthesize key-down"),
            }
        }

        if !owned.is_empty() {
            debug!(?owned, "pressed modifiers");
        }
        owned
    }

    /// Releases exactly the keys in `owned`, in reverse press order
    ///
    /// An empty list sends nothing.
    pub fn release_modifiers(&self, owned: &[VirtualKey]) {
        if owned.is_empty() {
            return;
        }

        let events: Vec<InputEvent> = owned.iter().rev().map(|k| InputEvent::KeyUp(*k)).collect();
        match self.injector.send(&events) {
            Ok(accepted) if accepted == events.len() => {
                debug!(?owned, "released modifiers");
            }
            Ok(accepted) => {
                warn!(accepted, requested = events.len(), "partial key-up batch");
                self.release_one_by_one(&events[accepted..]);
            }
            Err(e) => {
                warn!(?owned, error = %e, "key-up batch failed, retrying per key");
                self.release_one_by_one(&events);
            }
        }
    }

    fn release_one_by_one(&self, key_ups: &[InputEvent]) {
        for event in key_ups {
            if !matches!(self.injector.send(std::slice::from_ref(event)), Ok(1)) {
                warn!(?event, "modifier may still be held");
            }
        }
    }

    /// Requested modifiers that are not down right now
    ///
    /// Empty once every key in `modifiers` is held, whether this process
    /// pressed it or the user did.
    pub fn missing(&self, modifiers: ModifierSet) -> Vec<VirtualKey> {
        modifiers
            .keys()
            .filter(|key| !self.is_key_pressed(*key))
            .collect()
    }

    /// Presses `modifiers` and returns a guard that releases them
    pub fn hold(&self, modifiers: ModifierSet) -> HeldModifiers<'_> {
        let owned = self.press_modifiers(modifiers);
        HeldModifiers {
            keys: self,
            owned,
            released: false,
        }
    }
}

/// Scoped ownership of synthesized modifier key-downs
///
/// Releases its keys exactly once: explicitly through [`release`] or on drop.
///
/// [`release`]: HeldModifiers::release
#[must_use = "dropping the guard releases the modifiers immediately"]
pub struct HeldModifiers<'a> {
    keys: &'a ModifierKeys,
    owned: Vec<VirtualKey>,
    released: bool,
}

impl HeldModifiers<'_> {
    /// Keys this guard pressed and will release
    pub fn owned(&self) -> &[VirtualKey] {
        &self.owned
    }

    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if !self.released {
            self.released = true;
            self.keys.release_modifiers(&self.owned);
        }
    }
}

impl Drop for HeldModifiers<'_> {
    fn drop(&mut self) {
        // Guaranteed cleanup
        self.release_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fakes::FakeDesktop;

    fn keys_on(desktop: &Arc<FakeDesktop>) -> ModifierKeys {
        ModifierKeys::new(desktop.clone(), desktop.clone())
    }

    #[test]
    fn press_returns_only_keys_it_pressed() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        let owned = keys.press_modifiers(ModifierSet::CTRL);
        assert_eq!(owned, vec![VirtualKey::Control]);
        assert!(keys.is_key_pressed(VirtualKey::Control));

        keys.release_modifiers(&owned);
        assert!(!keys.is_key_pressed(VirtualKey::Control));
    }

    #[test]
    fn user_held_key_is_never_touched() {
        let desktop = Arc::new(FakeDesktop::primary());
        desktop.with(|s| s.keys_down.insert(VirtualKey::Shift));
        let keys = keys_on(&desktop);

        let owned = keys.press_modifiers(ModifierSet::SHIFT);
        assert!(owned.is_empty());
        keys.release_modifiers(&owned);

        assert!(desktop.events().is_empty());
        assert!(keys.is_key_pressed(VirtualKey::Shift));
    }

    #[test]
    fn release_runs_in_reverse_press_order() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        let owned = keys.press_modifiers(ModifierSet::CTRL | ModifierSet::SHIFT | ModifierSet::ALT);
        keys.release_modifiers(&owned);

        assert_eq!(
            desktop.events(),
            vec![
                InputEvent::KeyDown(VirtualKey::Control),
                InputEvent::KeyDown(VirtualKey::Shift),
                InputEvent::KeyDown(VirtualKey::Menu),
                InputEvent::KeyUp(VirtualKey::Menu),
                InputEvent::KeyUp(VirtualKey::Shift),
                InputEvent::KeyUp(VirtualKey::Control),
            ]
        );
    }

    #[test]
    fn balance_law_restores_prior_state() {
        let desktop = Arc::new(FakeDesktop::primary());
        desktop.with(|s| s.keys_down.insert(VirtualKey::Menu));
        let keys = keys_on(&desktop);
        let all = ModifierSet::CTRL | ModifierSet::SHIFT | ModifierSet::ALT;
        let before: Vec<bool> = all.keys().map(|k| keys.is_key_pressed(k)).collect();

        let owned = keys.press_modifiers(all);
        assert_eq!(owned, vec![VirtualKey::Control, VirtualKey::Shift]);
        keys.release_modifiers(&owned);

        let after: Vec<bool> = all.keys().map(|k| keys.is_key_pressed(k)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rejected_key_down_is_not_owned() {
        let desktop = Arc::new(FakeDesktop::primary());
        desktop.with(|s| s.accept_limit = Some(0));
        let keys = keys_on(&desktop);

        assert!(keys.press_modifiers(ModifierSet::CTRL).is_empty());
    }

    #[test]
    fn failed_key_up_batch_is_retried_per_key() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        let owned = keys.press_modifiers(ModifierSet::CTRL | ModifierSet::SHIFT);
        desktop.with(|s| s.failing_key_up_batches = 1);
        keys.release_modifiers(&owned);

        assert!(!keys.is_key_pressed(VirtualKey::Control));
        assert!(!keys.is_key_pressed(VirtualKey::Shift));
        assert_eq!(desktop.with(|s| s.failing_key_up_batches), 0);
    }

    #[test]
    fn missing_reports_rejected_keys_only() {
        let desktop = Arc::new(FakeDesktop::primary());
        desktop.with(|s| {
            s.keys_down.insert(VirtualKey::Shift);
            s.reject_key_down = true;
        });
        let keys = keys_on(&desktop);

        let held = keys.hold(ModifierSet::CTRL | ModifierSet::SHIFT);
        assert!(held.owned().is_empty());
        assert_eq!(
            keys.missing(ModifierSet::CTRL | ModifierSet::SHIFT),
            vec![VirtualKey::Control]
        );
        assert!(keys.missing(ModifierSet::SHIFT).is_empty());
    }

    #[test]
    fn guard_releases_on_drop() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        {
            let held = keys.hold(ModifierSet::CTRL | ModifierSet::ALT);
            assert_eq!(held.owned(), &[VirtualKey::Control, VirtualKey::Menu]);
            assert!(keys.is_key_pressed(VirtualKey::Control));
        }

        assert!(!keys.is_key_pressed(VirtualKey::Control));
        assert!(!keys.is_key_pressed(VirtualKey::Menu));
    }

    #[test]
    fn guard_releases_exactly_once() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        let held = keys.hold(ModifierSet::SHIFT);
        held.release();

        let key_ups = desktop
            .events()
            .into_iter()
            .filter(|e| matches!(e, InputEvent::KeyUp(_)))
            .count();
        assert_eq!(key_ups, 1);
    }

    #[test]
    fn empty_set_sends_nothing() {
        let desktop = Arc::new(FakeDesktop::primary());
        let keys = keys_on(&desktop);

        drop(keys.hold(ModifierSet::NONE));
        assert!(desktop.events().is_empty());
    }
}
