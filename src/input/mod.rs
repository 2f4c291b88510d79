//! Input sources feeding the shared control state
//!
//! 1. [`gamepad`] - gilrs polling task for a hot-pluggable controller
//! 2. [`keyboard`] - discrete WASD/arrow mapping fed by the UI event stream
//!
//! Both write the same three axes; whichever source wrote last wins, which
//! is the accepted model for sampled control input.

pub mod gamepad;
pub mod keyboard;

pub use gamepad::{GamepadHandle, GamepadSettings};
pub use keyboard::KeyboardInput;
