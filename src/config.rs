//! Application configuration
//!
//! Read once at startup from the platform config directory; every field has
//! a sensible default so a missing file just means stock settings. Nothing
//! is written back, runtime changes (speed scale, LED color) live only in
//! the control state.

use crate::control::MovementSettings;
use crate::input::GamepadSettings;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub movement: MovementSettings,
    pub gamepad: GamepadSettings,

    /// Speed scale at startup, before any slider or trim input.
    pub initial_speed_scale: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            movement: MovementSettings::default(),
            gamepad: GamepadSettings::default(),
            initial_speed_scale: 255,
        }
    }
}

impl AppConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("orbpilot").join("config.toml"))
    }

    /// Loads the config file if present, falling back to defaults on any
    /// missing or unparseable file.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("No config directory on this platform, using defaults");
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.initial_speed_scale, 255);
        assert_eq!(config.movement.tick_interval_ms, 33);
        assert_eq!(config.movement.trim_gain, 16.0);
        assert_eq!(config.gamepad.poll_interval_ms, 50);
        assert_eq!(config.gamepad.deadzone, 0.1);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: AppConfig =
            toml::from_str("initial_speed_scale = 128\n[movement]\ntick_interval_ms = 20\n")
                .unwrap();
        assert_eq!(config.initial_speed_scale, 128);
        assert_eq!(config.movement.tick_interval_ms, 20);
        assert_eq!(config.movement.trim_gain, 16.0);
        assert_eq!(config.gamepad.poll_interval_ms, 50);
    }
}
