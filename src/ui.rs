//! Desktop GUI
//!
//! Single-window egui front end: LED controls, speed slider, drive-mode
//! checkbox and a live readout of the control state. The window is also the
//! keyboard input surface; raw key events are forwarded to the keyboard
//! source before each frame renders.

use crate::control::portal::ControlPortal;
use crate::control::state::DriveMode;
use crate::input::keyboard::KeyboardInput;
use crate::toy::Rgb;
use eframe::egui::{self, Slider};
use std::time::Duration;
use tracing::warn;

pub struct OrbpilotUI {
    portal: ControlPortal,
    keyboard: KeyboardInput,

    /// Working copy for the color picker widget.
    main_color: [u8; 3],
    back_led: u8,
}

impl OrbpilotUI {
    pub fn new(cc: &eframe::CreationContext<'_>, portal: ControlPortal) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        let led = portal.snapshot().led_color;
        OrbpilotUI {
            keyboard: KeyboardInput::new(portal.clone()),
            portal,
            main_color: [led.r, led.g, led.b],
            back_led: 0,
        }
    }

    /// Feeds raw key transitions to the keyboard input source.
    fn forward_key_events(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|input| input.events.clone());
        for event in events {
            if let egui::Event::Key { key, pressed, .. } = event {
                self.keyboard.handle_key(key, pressed);
            }
        }
    }
}

impl eframe::App for OrbpilotUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.forward_key_events(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.ctx().request_repaint_after(Duration::from_millis(33));
            let snap = self.portal.snapshot();

            ui.heading("Orbpilot");
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label("Main LED colour");
                if ui.color_edit_button_srgb(&mut self.main_color).changed() {
                    let color = Rgb {
                        r: self.main_color[0],
                        g: self.main_color[1],
                        b: self.main_color[2],
                    };
                    if let Err(e) = self.portal.set_main_color(color) {
                        warn!("Main LED command failed: {}", e);
                    }
                }

                if ui.button("Recalibrate (A)").clicked() {
                    if let Err(e) = self.portal.trigger_recalibrate() {
                        warn!("Recalibrate command failed: {}", e);
                    }
                }

                let mut fpv = snap.drive_mode == DriveMode::RawDifferential;
                if ui.checkbox(&mut fpv, "FPV mode (B / E)").changed() {
                    let target = if fpv {
                        DriveMode::RawDifferential
                    } else {
                        DriveMode::Stabilized
                    };
                    if let Err(e) = self.portal.set_drive_mode(target) {
                        warn!("Drive mode change failed: {}", e);
                    }
                }
            });

            ui.add_space(10.0);

            if ui
                .add(Slider::new(&mut self.back_led, 0..=255).text("Back LED brightness"))
                .changed()
            {
                if let Err(e) = self.portal.set_back_led(self.back_led) {
                    warn!("Back LED command failed: {}", e);
                }
            }

            // The slider reflects z-axis trim changes made by the sticks, so
            // it starts from the live value every frame.
            let mut speed_scale = snap.speed_scale;
            if ui
                .add(Slider::new(&mut speed_scale, 0..=255).text("Speed (right stick)"))
                .changed()
            {
                self.portal.set_speed_scale(speed_scale);
            }

            ui.add_space(10.0);
            ui.label(format!(
                "Mode: {}   x: {:+.2}   y: {:+.2}   z: {:+.2}   scale: {}",
                snap.drive_mode, snap.x, snap.y, snap.z, snap.speed_scale
            ));
            ui.label("Drive with WASD or the left stick; arrows trim speed.");

            ui.add_space(20.0);
            if ui.button("Quit").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }
}
