//! Real-time control core
//!
//! Everything between raw input and the toy API:
//!
//! 1. [`state`] - shared control state, written by input sources
//! 2. [`normalizer`] - pure stick-to-command math
//! 3. [`drive_mode`] - stabilized/FPV transitions with ordered side effects
//! 4. [`movement`] - the fixed-cadence command loop
//! 5. [`portal`] - the surface exposed to the GUI and gamepad task
//!
//! # Data flow
//!
//! ```text
//! Gamepad/Keyboard ──► ControlState ──► MovementLoop ──► ToyDriveApi
//!                      (concurrent       (periodic
//!                       writes)           snapshot)
//! ```

pub mod drive_mode;
pub mod movement;
pub mod normalizer;
pub mod portal;
pub mod state;

pub use drive_mode::DriveModeController;
pub use movement::{MovementHandle, MovementLoop, MovementSettings};
pub use portal::ControlPortal;
pub use state::{AxisKind, ControlHandle, ControlSnapshot, DriveMode};
