//! Shared control state
//!
//! Exactly one [`ControlState`] exists for the lifetime of the application.
//! Input sources (gamepad task, keyboard via the UI thread) write individual
//! fields; the movement loop reads a snapshot each tick. Fields are
//! independent, last-writer-wins: the loop may see one axis a tick staler
//! than another, which is acceptable for sampled control input.

use crate::toy::Rgb;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// The two drive modes of the robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DriveMode {
    /// Heading+speed commands; the robot's attitude controller keeps it steady.
    #[default]
    Stabilized,
    /// Tank-style left/right motor power, stabilization off ("FPV").
    RawDifferential,
}

impl DriveMode {
    pub fn toggled(self) -> Self {
        match self {
            DriveMode::Stabilized => DriveMode::RawDifferential,
            DriveMode::RawDifferential => DriveMode::Stabilized,
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveMode::Stabilized => write!(f, "Stabilized"),
            DriveMode::RawDifferential => write!(f, "FPV"),
        }
    }
}

/// The three control axes writable by input sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisKind {
    /// Lateral (steering).
    X,
    /// Forward/back (throttle).
    Y,
    /// Speed-scale trim rate.
    Z,
}

#[derive(Clone, Debug)]
struct ControlState {
    x: f32,
    y: f32,
    z: f32,
    speed_scale: u8,
    drive_mode: DriveMode,
    led_color: Rgb,
}

/// Point-in-time copy of the control state, taken once per movement tick.
#[derive(Clone, Copy, Debug)]
pub struct ControlSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub speed_scale: u8,
    pub drive_mode: DriveMode,
    pub led_color: Rgb,
}

/// Cloneable handle to the shared control state.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    inner: Arc<RwLock<ControlState>>,
}

impl ControlHandle {
    pub fn new(initial_speed_scale: u8) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ControlState {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                speed_scale: initial_speed_scale,
                drive_mode: DriveMode::default(),
                led_color: Rgb::WHITE,
            })),
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let state = self.inner.read().expect("control state lock poisoned");
        ControlSnapshot {
            x: state.x,
            y: state.y,
            z: state.z,
            speed_scale: state.speed_scale,
            drive_mode: state.drive_mode,
            led_color: state.led_color,
        }
    }

    /// Writes one axis. Out-of-range values from a misbehaving source are
    /// clamped to [-1, 1], never propagated as a fault.
    pub fn set_axis(&self, kind: AxisKind, value: f32) {
        let clamped = if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            warn!("Non-finite {:?} axis value, treating as neutral", kind);
            0.0
        };
        if clamped != value {
            debug!("Clamped {:?} axis value {} to {}", kind, value, clamped);
        }

        let mut state = self.inner.write().expect("control state lock poisoned");
        match kind {
            AxisKind::X => state.x = clamped,
            AxisKind::Y => state.y = clamped,
            AxisKind::Z => state.z = clamped,
        }
    }

    /// Zeroes all three axes at once, used when the active gamepad vanishes.
    pub fn reset_axes(&self) {
        let mut state = self.inner.write().expect("control state lock poisoned");
        state.x = 0.0;
        state.y = 0.0;
        state.z = 0.0;
    }

    pub fn speed_scale(&self) -> u8 {
        self.inner
            .read()
            .expect("control state lock poisoned")
            .speed_scale
    }

    pub fn set_speed_scale(&self, value: u8) {
        self.inner
            .write()
            .expect("control state lock poisoned")
            .speed_scale = value;
    }

    /// Saturating adjustment of the speed scale, used by the z-axis trim.
    pub fn adjust_speed_scale(&self, delta: i16) -> u8 {
        let mut state = self.inner.write().expect("control state lock poisoned");
        let adjusted = (state.speed_scale as i16 + delta).clamp(0, 255) as u8;
        state.speed_scale = adjusted;
        adjusted
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.inner
            .read()
            .expect("control state lock poisoned")
            .drive_mode
    }

    /// Only [`DriveModeController`](crate::control::drive_mode::DriveModeController)
    /// may call this, after issuing the transition commands in order.
    pub(crate) fn set_drive_mode(&self, mode: DriveMode) {
        self.inner
            .write()
            .expect("control state lock poisoned")
            .drive_mode = mode;
    }

    pub fn set_led_color(&self, color: Rgb) {
        self.inner
            .write()
            .expect("control state lock poisoned")
            .led_color = color;
    }
}
