pub mod config;
pub mod control;
pub mod input;
pub mod toy;
pub mod ui;

use crate::config::AppConfig;
use crate::control::{ControlHandle, ControlPortal, MovementHandle};
use crate::input::GamepadHandle;
use crate::toy::{LoggingToy, ToyDriveApi};
use crate::ui::OrbpilotUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = AppConfig::load();
    info!("Starting orbpilot with config: {:?}", config);

    // The BLE device glue plugs in here; without it every command is traced.
    let toy: Arc<dyn ToyDriveApi> = Arc::new(LoggingToy::default());

    let control = ControlHandle::new(config.initial_speed_scale);
    let portal = ControlPortal::new(control.clone(), toy.clone());

    let cancel = CancellationToken::new();

    // Keyboard input keeps working without a pad
    if let Err(e) = GamepadHandle::spawn(config.gamepad, portal.clone(), cancel.clone()) {
        warn!("Gamepad input unavailable: {}", e);
    }

    let mut movement =
        MovementHandle::spawn(control, toy, config.movement, cancel.clone());

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport =
        egui::ViewportBuilder::default().with_inner_size(egui::vec2(640.0, 400.0));

    let ui_portal = portal.clone();
    let ui_result = eframe::run_native(
        "Orbpilot",
        native_options,
        Box::new(|cc| Ok(Box::new(OrbpilotUI::new(cc, ui_portal)))),
    );

    // Window closed: stop the background tasks and leave the robot stopped.
    info!("UI closed, shutting down control tasks");
    cancel.cancel();
    movement.shutdown().await;

    ui_result.map_err(|e| eyre!("UI terminated with error: {}", e))?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
