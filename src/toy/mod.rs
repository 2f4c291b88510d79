//! Abstract toy-control API
//!
//! The control core never talks to a radio directly; it issues fire-and-forget
//! commands through [`ToyDriveApi`]. The concrete BLE transport lives outside
//! this crate and plugs in behind the trait. [`LoggingToy`] is the default
//! implementation used when no transport is linked, so the full input pipeline
//! can be exercised without hardware.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// RGB triple for the main LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Spin direction of one motor side in raw mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorDirection {
    Forward,
    Reverse,
}

// Toy command errors
#[derive(Debug, thiserror::Error)]
pub enum ToyError {
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Device not connected: {0}")]
    NotConnectedError(String),
}

/// Command surface of the robot.
///
/// All operations are fire-and-forget over an unreliable transport; none
/// return data consumed by the core. Implementations must be callable from
/// multiple tokio tasks concurrently.
pub trait ToyDriveApi: Send + Sync {
    /// Commands a new heading in degrees, 0 = the calibrated "forward".
    fn set_heading(&self, degrees: u16) -> Result<(), ToyError>;

    /// Commands forward speed along the current heading.
    fn set_speed(&self, speed: u8) -> Result<(), ToyError>;

    /// Drives both motors directly, bypassing stabilization.
    fn set_raw_motor(
        &self,
        left_direction: MotorDirection,
        left_power: u8,
        right_direction: MotorDirection,
        right_power: u8,
    ) -> Result<(), ToyError>;

    /// Enables or disables the onboard attitude controller.
    fn set_stabilization(&self, enabled: bool) -> Result<(), ToyError>;

    /// Re-zeroes the heading reference ("aim") to the robot's current orientation.
    fn reset_aim(&self) -> Result<(), ToyError>;

    fn set_main_led(&self, color: Rgb) -> Result<(), ToyError>;

    fn set_back_led(&self, brightness: u8) -> Result<(), ToyError>;
}

/// Transportless [`ToyDriveApi`] that traces every command.
///
/// Stands in for the BLE glue during development and UI work.
#[derive(Debug, Default)]
pub struct LoggingToy {}

impl ToyDriveApi for LoggingToy {
    fn set_heading(&self, degrees: u16) -> Result<(), ToyError> {
        debug!("toy: set_heading({})", degrees);
        Ok(())
    }

    fn set_speed(&self, speed: u8) -> Result<(), ToyError> {
        debug!("toy: set_speed({})", speed);
        Ok(())
    }

    fn set_raw_motor(
        &self,
        left_direction: MotorDirection,
        left_power: u8,
        right_direction: MotorDirection,
        right_power: u8,
    ) -> Result<(), ToyError> {
        debug!(
            "toy: set_raw_motor({:?}, {}, {:?}, {})",
            left_direction, left_power, right_direction, right_power
        );
        Ok(())
    }

    fn set_stabilization(&self, enabled: bool) -> Result<(), ToyError> {
        debug!("toy: set_stabilization({})", enabled);
        Ok(())
    }

    fn reset_aim(&self) -> Result<(), ToyError> {
        debug!("toy: reset_aim()");
        Ok(())
    }

    fn set_main_led(&self, color: Rgb) -> Result<(), ToyError> {
        debug!("toy: set_main_led({})", color);
        Ok(())
    }

    fn set_back_led(&self, brightness: u8) -> Result<(), ToyError> {
        debug!("toy: set_back_led({})", brightness);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// One recorded command, for asserting order and content in tests.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ToyCommand {
        Heading(u16),
        Speed(u8),
        RawMotor(MotorDirection, u8, MotorDirection, u8),
        Stabilization(bool),
        ResetAim,
        MainLed(Rgb),
        BackLed(u8),
    }

    /// Records every issued command; optionally fails all of them.
    #[derive(Debug, Default)]
    pub struct RecordingToy {
        pub commands: Mutex<Vec<ToyCommand>>,
        pub fail: bool,
    }

    impl RecordingToy {
        pub fn failing() -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn recorded(&self) -> Vec<ToyCommand> {
            self.commands.lock().unwrap().clone()
        }

        fn record(&self, command: ToyCommand) -> Result<(), ToyError> {
            self.commands.lock().unwrap().push(command);
            if self.fail {
                Err(ToyError::TransportError("mock transport down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl ToyDriveApi for RecordingToy {
        fn set_heading(&self, degrees: u16) -> Result<(), ToyError> {
            self.record(ToyCommand::Heading(degrees))
        }

        fn set_speed(&self, speed: u8) -> Result<(), ToyError> {
            self.record(ToyCommand::Speed(speed))
        }

        fn set_raw_motor(
            &self,
            left_direction: MotorDirection,
            left_power: u8,
            right_direction: MotorDirection,
            right_power: u8,
        ) -> Result<(), ToyError> {
            self.record(ToyCommand::RawMotor(
                left_direction,
                left_power,
                right_direction,
                right_power,
            ))
        }

        fn set_stabilization(&self, enabled: bool) -> Result<(), ToyError> {
            self.record(ToyCommand::Stabilization(enabled))
        }

        fn reset_aim(&self) -> Result<(), ToyError> {
            self.record(ToyCommand::ResetAim)
        }

        fn set_main_led(&self, color: Rgb) -> Result<(), ToyError> {
            self.record(ToyCommand::MainLed(color))
        }

        fn set_back_led(&self, brightness: u8) -> Result<(), ToyError> {
            self.record(ToyCommand::BackLed(brightness))
        }
    }
}
