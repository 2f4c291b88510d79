//! Drive-mode transitions
//!
//! The one place in the crate where ordering of toy commands matters.
//! Entering FPV must disable stabilization before any raw motor command is
//! issued; leaving FPV must zero the motors before stabilization comes back.
//! A transition spans two API calls plus the state write, so the whole thing
//! runs under a mutex and counts as one logical operation.

use crate::control::state::{ControlHandle, DriveMode};
use crate::toy::{MotorDirection, ToyDriveApi, ToyError};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Owns the drive-mode state machine. Clones share the same transition lock.
#[derive(Clone)]
pub struct DriveModeController {
    control: ControlHandle,
    toy: Arc<dyn ToyDriveApi>,
    transition_gate: Arc<Mutex<()>>,
}

impl DriveModeController {
    pub fn new(control: ControlHandle, toy: Arc<dyn ToyDriveApi>) -> Self {
        Self {
            control,
            toy,
            transition_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn current(&self) -> DriveMode {
        self.control.drive_mode()
    }

    /// Transitions to `target`, issuing the required toy commands.
    ///
    /// A no-op when `target` is already current: no API calls are made.
    pub fn set_mode(&self, target: DriveMode) -> Result<DriveMode, ToyError> {
        let _gate = self
            .transition_gate
            .lock()
            .expect("drive mode transition lock poisoned");

        let current = self.control.drive_mode();
        if current == target {
            debug!("Drive mode already {}, nothing to do", target);
            return Ok(current);
        }

        match target {
            DriveMode::RawDifferential => {
                info!("Entering FPV mode, disabling stabilization");
                self.toy.set_stabilization(false)?;
            }
            DriveMode::Stabilized => {
                // Zero the motors first: the robot must never sit
                // unstabilized with a stale raw command active.
                info!("Leaving FPV mode, zeroing motors and re-enabling stabilization");
                self.toy.set_raw_motor(
                    MotorDirection::Forward,
                    0,
                    MotorDirection::Forward,
                    0,
                )?;
                self.toy.set_stabilization(true)?;
            }
        }

        self.control.set_drive_mode(target);
        Ok(target)
    }

    /// Flips the current mode via the same transition path.
    pub fn toggle(&self) -> Result<DriveMode, ToyError> {
        let target = self.control.drive_mode().toggled();
        self.set_mode(target)
    }
}
