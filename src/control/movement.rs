//! Movement loop
//!
//! A cancellable tokio task that reads the shared control state at a fixed
//! cadence and issues exactly one drive command per tick. The tick interval
//! bounds the command rate so the transport never saturates.
//!
//! ```text
//! ControlState ──► snapshot ──► normalizer ──► ToyDriveApi
//!                  (per tick)
//! ```
//!
//! Transport faults are logged and skipped; a missed command is recovered by
//! the next tick, so nothing here ever terminates the loop.

use crate::control::normalizer::{to_differential, to_polar};
use crate::control::state::{ControlHandle, DriveMode};
use crate::toy::{MotorDirection, ToyDriveApi};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Settings for the movement loop.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    /// Minimum time between drive commands, in milliseconds.
    ///
    /// 20-50 ms keeps the robot responsive without flooding the transport.
    pub tick_interval_ms: u64,

    /// Speed-scale change per tick at full z deflection.
    pub trim_gain: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            trim_gain: 16.0,
        }
    }
}

/// Issues drive commands from control-state snapshots.
pub struct MovementLoop {
    control: ControlHandle,
    toy: Arc<dyn ToyDriveApi>,
    settings: MovementSettings,
}

impl MovementLoop {
    pub fn new(
        control: ControlHandle,
        toy: Arc<dyn ToyDriveApi>,
        settings: MovementSettings,
    ) -> Self {
        Self {
            control,
            toy,
            settings,
        }
    }

    /// One control tick: snapshot, normalize, command.
    pub fn tick(&self) {
        let snap = self.control.snapshot();

        match snap.drive_mode {
            DriveMode::RawDifferential => {
                let (left, right) = to_differential(snap.x, snap.y, snap.speed_scale);
                let (left_direction, left_power) = direction_and_power(left);
                let (right_direction, right_power) = direction_and_power(right);

                if let Err(e) = self.toy.set_raw_motor(
                    left_direction,
                    left_power,
                    right_direction,
                    right_power,
                ) {
                    warn!("Raw motor command failed: {}", e);
                }
            }
            DriveMode::Stabilized => {
                let (distance, angle) = to_polar(snap.x, snap.y);
                let scale = snap.speed_scale as f32;
                let speed = (distance * scale).clamp(0.0, scale).round() as u8;

                if let Err(e) = self.toy.set_speed(speed) {
                    warn!("Speed command failed: {}", e);
                }

                // A neutral stick has no angle; the last commanded heading
                // stays in effect.
                if let Some(angle) = angle {
                    let heading = angle.round() as u16 % 360;
                    if let Err(e) = self.toy.set_heading(heading) {
                        warn!("Heading command failed: {}", e);
                    }
                }
            }
        }

        if snap.z != 0.0 {
            let delta = (snap.z * self.settings.trim_gain).round() as i16;
            let adjusted = self.control.adjust_speed_scale(delta);
            debug!("Speed trim {:+} -> scale {}", delta, adjusted);
        }
    }

    /// Runs ticks until cancelled, then leaves the robot in a safe state.
    pub async fn run_until_cancelled(self, cancel: CancellationToken) {
        info!(
            "Starting movement loop with {}ms tick interval",
            self.settings.tick_interval_ms
        );

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.settings.tick_interval_ms));

        let mut ticks: u64 = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Movement loop cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    self.tick();
                    ticks += 1;

                    let now = Local::now();
                    if now - last_stats_time > stats_interval {
                        let elapsed = (now - last_stats_time).num_seconds();
                        info!(
                            "Movement loop stats: {} ticks in {}s ({:.1}/sec)",
                            ticks,
                            elapsed,
                            ticks as f64 / elapsed as f64
                        );
                        ticks = 0;
                        last_stats_time = now;
                    }
                }
            }
        }

        self.issue_safe_stop();
        info!("Movement loop finished");
    }

    /// Final stop command on shutdown so the robot is never left driving.
    fn issue_safe_stop(&self) {
        if let Err(e) = self.toy.set_speed(0) {
            warn!("Final stop command failed: {}", e);
        }
        if self.control.drive_mode() == DriveMode::RawDifferential {
            if let Err(e) = self.toy.set_raw_motor(
                MotorDirection::Forward,
                0,
                MotorDirection::Forward,
                0,
            ) {
                warn!("Final motor zero failed: {}", e);
            }
        }
    }
}

fn direction_and_power(power: i16) -> (MotorDirection, u8) {
    if power < 0 {
        (MotorDirection::Reverse, power.unsigned_abs().min(255) as u8)
    } else {
        (MotorDirection::Forward, power.unsigned_abs().min(255) as u8)
    }
}

/// Handle for the movement loop task.
///
/// Spawns the loop on the tokio runtime and provides a graceful shutdown
/// that waits for the final safe-state command to go out.
pub struct MovementHandle {
    task_handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl MovementHandle {
    pub fn spawn(
        control: ControlHandle,
        toy: Arc<dyn ToyDriveApi>,
        settings: MovementSettings,
        cancel: CancellationToken,
    ) -> Self {
        let movement_loop = MovementLoop::new(control, toy, settings);
        let loop_cancel = cancel.clone();
        let task_handle = tokio::spawn(async move {
            movement_loop.run_until_cancelled(loop_cancel).await;
        });

        info!("Movement loop spawned");
        Self {
            task_handle: Some(task_handle),
            cancel,
        }
    }

    /// Cancels the loop and waits for its safe-state command.
    pub async fn shutdown(&mut self) {
        debug!("Sending shutdown signal to movement loop");
        self.cancel.cancel();

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!("Movement loop task panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::state::AxisKind;
    use crate::toy::mock::{RecordingToy, ToyCommand};

    fn movement_loop(initial_scale: u8) -> (MovementLoop, ControlHandle, Arc<RecordingToy>) {
        let toy = Arc::new(RecordingToy::default());
        let control = ControlHandle::new(initial_scale);
        let movement = MovementLoop::new(
            control.clone(),
            toy.clone(),
            MovementSettings::default(),
        );
        (movement, control, toy)
    }

    #[test]
    fn neutral_stick_commands_speed_zero_and_no_heading() {
        let (movement, _control, toy) = movement_loop(255);
        movement.tick();
        assert_eq!(toy.recorded(), vec![ToyCommand::Speed(0)]);
    }

    #[test]
    fn forward_stick_commands_full_speed_heading_zero() {
        let (movement, control, toy) = movement_loop(200);
        control.set_axis(AxisKind::Y, 1.0);
        movement.tick();

        assert_eq!(
            toy.recorded(),
            vec![ToyCommand::Speed(200), ToyCommand::Heading(0)]
        );
    }

    #[test]
    fn diagonal_speed_is_clamped_to_scale() {
        // distance sqrt(2) would exceed the scale without the clamp
        let (movement, control, toy) = movement_loop(100);
        control.set_axis(AxisKind::X, 1.0);
        control.set_axis(AxisKind::Y, 1.0);
        movement.tick();

        assert_eq!(
            toy.recorded(),
            vec![ToyCommand::Speed(100), ToyCommand::Heading(45)]
        );
    }

    #[test]
    fn fpv_straight_forward_drives_both_sides_forward() {
        let (movement, control, toy) = movement_loop(200);
        control.set_drive_mode(DriveMode::RawDifferential);
        control.set_axis(AxisKind::Y, 1.0);
        movement.tick();

        assert_eq!(
            toy.recorded(),
            vec![ToyCommand::RawMotor(
                MotorDirection::Forward,
                200,
                MotorDirection::Forward,
                200
            )]
        );
    }

    #[test]
    fn fpv_full_right_reverses_right_side() {
        let (movement, control, toy) = movement_loop(255);
        control.set_drive_mode(DriveMode::RawDifferential);
        control.set_axis(AxisKind::X, 1.0);
        movement.tick();

        assert_eq!(
            toy.recorded(),
            vec![ToyCommand::RawMotor(
                MotorDirection::Forward,
                255,
                MotorDirection::Reverse,
                255
            )]
        );
    }

    #[test]
    fn z_axis_trims_speed_scale_each_tick() {
        let (movement, control, _toy) = movement_loop(128);
        control.set_axis(AxisKind::Z, 1.0);
        movement.tick();
        assert_eq!(control.speed_scale(), 144);
        movement.tick();
        assert_eq!(control.speed_scale(), 160);

        control.set_axis(AxisKind::Z, -1.0);
        movement.tick();
        assert_eq!(control.speed_scale(), 144);
    }

    #[test]
    fn transport_failure_does_not_stop_ticking() {
        let toy = Arc::new(RecordingToy::failing());
        let control = ControlHandle::new(255);
        let movement = MovementLoop::new(
            control.clone(),
            toy.clone(),
            MovementSettings::default(),
        );

        movement.tick();
        movement.tick();
        // Every failed command was still attempted
        assert_eq!(toy.recorded().len(), 2);
    }

    #[test]
    fn safe_stop_zeroes_motors_in_fpv() {
        let (movement, control, toy) = movement_loop(255);
        control.set_drive_mode(DriveMode::RawDifferential);
        movement.issue_safe_stop();

        assert_eq!(
            toy.recorded(),
            vec![
                ToyCommand::Speed(0),
                ToyCommand::RawMotor(MotorDirection::Forward, 0, MotorDirection::Forward, 0),
            ]
        );
    }

    #[tokio::test]
    async fn shutdown_issues_final_stop() {
        let toy = Arc::new(RecordingToy::default());
        let control = ControlHandle::new(255);
        let cancel = CancellationToken::new();
        let mut handle = MovementHandle::spawn(
            control,
            toy.clone(),
            MovementSettings::default(),
            cancel,
        );

        handle.shutdown().await;
        assert!(toy.recorded().contains(&ToyCommand::Speed(0)));
    }
}
