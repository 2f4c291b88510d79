//! Control portal
//!
//! The single surface the GUI and the gamepad task consume. Bundles the
//! shared state handle, the drive-mode controller and the toy API so callers
//! hold one cloneable object instead of three.

use crate::control::drive_mode::DriveModeController;
use crate::control::state::{AxisKind, ControlHandle, ControlSnapshot, DriveMode};
use crate::toy::{Rgb, ToyDriveApi, ToyError};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ControlPortal {
    control: ControlHandle,
    mode_controller: DriveModeController,
    toy: Arc<dyn ToyDriveApi>,
}

impl ControlPortal {
    pub fn new(control: ControlHandle, toy: Arc<dyn ToyDriveApi>) -> Self {
        let mode_controller = DriveModeController::new(control.clone(), toy.clone());
        Self {
            control,
            mode_controller,
            toy,
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        self.control.snapshot()
    }

    pub fn set_axis(&self, kind: AxisKind, value: f32) {
        self.control.set_axis(kind, value);
    }

    pub fn reset_axes(&self) {
        self.control.reset_axes();
    }

    pub fn set_speed_scale(&self, value: u8) {
        self.control.set_speed_scale(value);
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.mode_controller.current()
    }

    pub fn set_drive_mode(&self, mode: DriveMode) -> Result<DriveMode, ToyError> {
        self.mode_controller.set_mode(mode)
    }

    pub fn toggle_drive_mode(&self) -> Result<DriveMode, ToyError> {
        let mode = self.mode_controller.toggle()?;
        info!("Drive mode is now {}", mode);
        Ok(mode)
    }

    /// Re-zeroes the robot's heading reference to its current orientation.
    pub fn trigger_recalibrate(&self) -> Result<(), ToyError> {
        info!("Recalibrating aim");
        self.toy.reset_aim()
    }

    /// Updates the main LED on the robot and the remembered color.
    pub fn set_main_color(&self, color: Rgb) -> Result<(), ToyError> {
        self.control.set_led_color(color);
        self.toy.set_main_led(color)
    }

    pub fn set_back_led(&self, brightness: u8) -> Result<(), ToyError> {
        self.toy.set_back_led(brightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::mock::{RecordingToy, ToyCommand};

    fn portal() -> (ControlPortal, Arc<RecordingToy>) {
        let toy = Arc::new(RecordingToy::default());
        (ControlPortal::new(ControlHandle::new(255), toy.clone()), toy)
    }

    #[test]
    fn recalibrate_forwards_reset_aim() {
        let (portal, toy) = portal();
        portal.trigger_recalibrate().unwrap();
        assert_eq!(toy.recorded(), vec![ToyCommand::ResetAim]);
    }

    #[test]
    fn main_color_updates_state_and_toy() {
        let (portal, toy) = portal();
        let teal = Rgb { r: 0, g: 128, b: 128 };
        portal.set_main_color(teal).unwrap();

        assert_eq!(portal.snapshot().led_color, teal);
        assert_eq!(toy.recorded(), vec![ToyCommand::MainLed(teal)]);
    }

    #[test]
    fn toggle_reports_new_mode() {
        let (portal, _toy) = portal();
        assert_eq!(
            portal.toggle_drive_mode().unwrap(),
            DriveMode::RawDifferential
        );
        assert_eq!(portal.drive_mode(), DriveMode::RawDifferential);
    }
}
