//! Keyboard input source
//!
//! Turns egui key events into discrete axis values. WASD drives x/y, the
//! left/right arrows drive the speed-trim z axis, and E toggles the drive
//! mode. The UI layer forwards raw key events here each frame; this module
//! keeps the pressed set and recomputes the axes after every change.

use crate::control::portal::ControlPortal;
use crate::control::state::AxisKind;
use egui::Key;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Discrete keyboard state feeding the shared control state.
pub struct KeyboardInput {
    pressed: HashSet<Key>,
    portal: ControlPortal,
}

impl KeyboardInput {
    pub fn new(portal: ControlPortal) -> Self {
        Self {
            pressed: HashSet::new(),
            portal,
        }
    }

    /// Handles one key transition from the UI event stream.
    ///
    /// Idempotent: OS key-repeat shows up as extra down events for an
    /// already-pressed key and is dropped, so the E toggle fires exactly
    /// once per physical press.
    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        let changed = if pressed {
            self.pressed.insert(key)
        } else {
            self.pressed.remove(&key)
        };
        if !changed {
            return;
        }

        if pressed && key == Key::E {
            if let Err(e) = self.portal.toggle_drive_mode() {
                warn!("Drive mode toggle failed: {}", e);
            }
        }

        self.recompute_axes();
    }

    fn recompute_axes(&self) {
        let axis = |positive: Key, negative: Key| -> f32 {
            let up = if self.pressed.contains(&positive) { 1.0 } else { 0.0 };
            let down = if self.pressed.contains(&negative) { 1.0 } else { 0.0 };
            up - down
        };

        let x = axis(Key::D, Key::A);
        let y = axis(Key::W, Key::S);
        let z = axis(Key::ArrowRight, Key::ArrowLeft);

        debug!("Keyboard axes: x={} y={} z={}", x, y, z);
        self.portal.set_axis(AxisKind::X, x);
        self.portal.set_axis(AxisKind::Y, y);
        self.portal.set_axis(AxisKind::Z, z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::state::{ControlHandle, DriveMode};
    use crate::toy::mock::{RecordingToy, ToyCommand};
    use std::sync::Arc;

    fn keyboard() -> (KeyboardInput, ControlPortal, Arc<RecordingToy>) {
        let toy = Arc::new(RecordingToy::default());
        let portal = ControlPortal::new(ControlHandle::new(255), toy.clone());
        (KeyboardInput::new(portal.clone()), portal, toy)
    }

    #[test]
    fn w_and_d_held_gives_diagonal() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::W, true);
        keyboard.handle_key(Key::D, true);

        let snap = portal.snapshot();
        assert_eq!((snap.x, snap.y), (1.0, 1.0));
    }

    #[test]
    fn opposing_keys_cancel() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::A, true);
        keyboard.handle_key(Key::D, true);
        assert_eq!(portal.snapshot().x, 0.0);

        keyboard.handle_key(Key::A, false);
        assert_eq!(portal.snapshot().x, 1.0);
    }

    #[test]
    fn arrows_drive_the_trim_axis() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::ArrowRight, true);
        assert_eq!(portal.snapshot().z, 1.0);

        keyboard.handle_key(Key::ArrowRight, false);
        keyboard.handle_key(Key::ArrowLeft, true);
        assert_eq!(portal.snapshot().z, -1.0);
    }

    #[test]
    fn release_clears_axes() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::W, true);
        keyboard.handle_key(Key::W, false);

        let snap = portal.snapshot();
        assert_eq!((snap.x, snap.y, snap.z), (0.0, 0.0, 0.0));
    }

    #[test]
    fn repeated_down_events_are_noops() {
        let (mut keyboard, portal, toy) = keyboard();
        keyboard.handle_key(Key::E, true);
        keyboard.handle_key(Key::E, true);
        keyboard.handle_key(Key::E, true);

        // One toggle fired, not three
        assert_eq!(portal.drive_mode(), DriveMode::RawDifferential);
        assert_eq!(toy.recorded(), vec![ToyCommand::Stabilization(false)]);
    }

    #[test]
    fn release_of_unpressed_key_is_ignored() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::S, false);
        assert_eq!(portal.snapshot().y, 0.0);
    }

    #[test]
    fn unmapped_keys_do_not_disturb_axes() {
        let (mut keyboard, portal, _toy) = keyboard();
        keyboard.handle_key(Key::W, true);
        keyboard.handle_key(Key::Q, true);

        let snap = portal.snapshot();
        assert_eq!((snap.x, snap.y, snap.z), (0.0, 1.0, 0.0));
    }
}
