//! Gamepad input source
//!
//! Polls a hot-pluggable analog controller through gilrs and writes axis
//! values straight into the shared control state. Buttons fire one-shot
//! actions on their press edge. A missing controller is not an error; the
//! keyboard source keeps working and a pad connected later is picked up
//! automatically.

use crate::control::normalizer::apply_deadzone;
use crate::control::portal::ControlPortal;
use crate::control::state::AxisKind;
use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use serde::Deserialize;
use statum::{machine, state, transition};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Gamepad polling settings.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GamepadSettings {
    /// Interval between draining pending hardware events, in milliseconds.
    pub poll_interval_ms: u64,

    /// Stick values with magnitude below this are treated as exactly zero.
    pub deadzone: f32,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            deadzone: 0.1,
        }
    }
}

// Gamepad source errors
#[derive(Debug, thiserror::Error)]
pub enum GamepadError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),
}

/// One-shot actions bound to button press edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    RecalibrateAim,
    ToggleDriveMode,
}

/// Maps a gilrs button to its one-shot action, if any.
///
/// South is the "A" position, East is "B" on common pads.
pub fn map_button_action(button: Button) -> Option<ButtonAction> {
    match button {
        Button::South => Some(ButtonAction::RecalibrateAim),
        Button::East => Some(ButtonAction::ToggleDriveMode),
        _ => None,
    }
}

/// Maps a gilrs axis to a control axis.
///
/// gilrs already reports stick-up as positive, so the y axis needs no sign
/// flip. Unmapped axes are ignored.
pub fn map_axis(axis: Axis) -> Option<AxisKind> {
    match axis {
        Axis::LeftStickX => Some(AxisKind::X),
        Axis::LeftStickY => Some(AxisKind::Y),
        Axis::RightStickX => Some(AxisKind::Z),
        _ => None,
    }
}

/// Tracks currently-pressed buttons so actions fire once per press.
#[derive(Debug, Default)]
pub struct ButtonTracker {
    pressed: HashMap<Button, DateTime<Local>>,
}

impl ButtonTracker {
    /// Records a press edge. Returns false for repeats while held.
    pub fn press(&mut self, button: Button) -> bool {
        if self.pressed.contains_key(&button) {
            return false;
        }
        self.pressed.insert(button, Local::now());
        true
    }

    /// Clears a press record, returning how long the button was held.
    pub fn release(&mut self, button: Button) -> Option<chrono::Duration> {
        self.pressed
            .remove(&button)
            .map(|pressed_at| Local::now() - pressed_at)
    }
}

// Gamepad source states
#[state]
#[derive(Debug, Clone)]
pub enum GamepadState {
    Initializing,
    Polling,
}

#[machine]
pub struct GamepadSource<GamepadState> {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad, bound at init or on a Connected event
    active_gamepad: Option<GamepadId>,

    settings: GamepadSettings,

    // Target for axis writes and button actions
    portal: ControlPortal,

    buttons: ButtonTracker,
}

impl GamepadSource<Initializing> {
    pub fn create(
        settings: GamepadSettings,
        portal: ControlPortal,
    ) -> Result<Self, GamepadError> {
        info!("Initializing gilrs gamepad interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            GamepadError::InitializationError(e.to_string())
        })?;

        Ok(Self::builder()
            .gilrs(gilrs)
            .settings(settings)
            .portal(portal)
            .buttons(ButtonTracker::default())
            .build())
    }
}

#[transition]
impl GamepadSource<Initializing> {
    /// Binds the first available gamepad and transitions to Polling.
    ///
    /// No connected pad is not a failure, merely no gamepad input until one
    /// shows up.
    pub fn initialize(mut self) -> GamepadSource<Polling> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if let Some((id, gamepad)) = gamepads.first() {
            info!(
                "Found {} gamepad(s), selected: {} ({})",
                gamepads.len(),
                gamepad.name(),
                id
            );
            self.active_gamepad = Some(*id);
        } else {
            warn!("No gamepad connected, waiting for hot-plug");
        }

        self.transition()
    }
}

impl GamepadSource<Polling> {
    /// Drains all pending gilrs events without blocking.
    fn drain_pending_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            self.handle_event(id, event);
        }
    }

    fn handle_event(&mut self, id: GamepadId, event: EventType) {
        match event {
            EventType::Connected => {
                if self.active_gamepad.is_none() {
                    let name = self.gilrs.gamepad(id).name().to_string();
                    info!("Gamepad connected: {} ({}), binding it", name, id);
                    self.active_gamepad = Some(id);
                } else {
                    debug!("Additional gamepad connected ({}), ignoring", id);
                }
                return;
            }
            EventType::Disconnected => {
                if self.active_gamepad == Some(id) {
                    warn!("Active gamepad disconnected, zeroing axes");
                    self.active_gamepad = None;
                    self.portal.reset_axes();
                }
                return;
            }
            _ => {}
        }

        if self.active_gamepad != Some(id) {
            debug!("Skipping event from non-active gamepad: {:?}", id);
            return;
        }

        match event {
            EventType::AxisChanged(axis, value, _) => {
                if let Some(kind) = map_axis(axis) {
                    let value = apply_deadzone(value, self.settings.deadzone);
                    self.portal.set_axis(kind, value);
                } else {
                    debug!("Ignoring unsupported axis: {:?}", axis);
                }
            }
            EventType::ButtonPressed(button, _) => {
                if !self.buttons.press(button) {
                    debug!("Repeat press for held button {:?}, ignoring", button);
                    return;
                }
                match map_button_action(button) {
                    Some(ButtonAction::RecalibrateAim) => {
                        if let Err(e) = self.portal.trigger_recalibrate() {
                            warn!("Recalibrate command failed: {}", e);
                        }
                    }
                    Some(ButtonAction::ToggleDriveMode) => {
                        if let Err(e) = self.portal.toggle_drive_mode() {
                            warn!("Drive mode toggle failed: {}", e);
                        }
                    }
                    None => debug!("No action bound to button {:?}", button),
                }
            }
            EventType::ButtonReleased(button, _) => {
                if let Some(held) = self.buttons.release(button) {
                    debug!(
                        "Button {:?} released after {}ms",
                        button,
                        held.num_milliseconds()
                    );
                }
            }
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
            }
        }
    }

    /// Polls at the configured interval until cancelled.
    pub async fn run_poll_loop(mut self, cancel: CancellationToken) {
        info!(
            "Starting gamepad poll loop with {}ms interval",
            self.settings.poll_interval_ms
        );

        let poll_interval = Duration::from_millis(self.settings.poll_interval_ms);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Gamepad poll loop cancelled");
                    break;
                }

                _ = tokio::time::sleep(poll_interval) => {
                    self.drain_pending_events();
                }
            }
        }
    }
}

/// Handle for the gamepad polling task.
pub struct GamepadHandle {}

impl GamepadHandle {
    /// Spawns the gamepad source as a tokio task.
    ///
    /// Fails only when the gilrs backend itself cannot start; the caller
    /// should log that and continue with keyboard input alone.
    pub fn spawn(
        settings: GamepadSettings,
        portal: ControlPortal,
        cancel: CancellationToken,
    ) -> Result<Self, GamepadError> {
        let source = GamepadSource::create(settings, portal)?;

        tokio::spawn(async move {
            let polling = source.initialize();
            polling.run_poll_loop(cancel).await;
        });

        info!("Gamepad source spawned");
        Ok(Self {})
    }
}
