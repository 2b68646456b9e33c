//! Synthetic orientation source for running the bridge without earbuds.
//!
//! Sweeps yaw at a constant rate and nods pitch on a four second period,
//! in the sensor frame, so every axis mapping can be checked end to end.

use crate::SampleSink;
use buds_pose::euler::{deg_to_rad, from_euler, EulerAngles};
use buds_pose::Quaternion;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Length of one nod, in seconds.
const NOD_PERIOD_SECS: f64 = 4.0;

pub struct SimulatedSource {
    sample_hz: u32,
    yaw_step_deg: f64,
    pitch_amplitude_deg: f64,
    tick: u64,
}

impl SimulatedSource {
    pub fn new(sample_hz: u32, yaw_step_deg: f64, pitch_amplitude_deg: f64) -> Self {
        Self {
            sample_hz: sample_hz.max(1),
            yaw_step_deg,
            pitch_amplitude_deg,
            tick: 0,
        }
    }

    /// Yaw and pitch in degrees for sample `tick`.
    pub fn angles_at(&self, tick: u64) -> (f64, f64) {
        let yaw = wrap_degrees(tick as f64 * self.yaw_step_deg);
        let phase = tick as f64 / (self.sample_hz as f64 * NOD_PERIOD_SECS);
        let pitch = self.pitch_amplitude_deg * (std::f64::consts::TAU * phase).sin();
        (yaw, pitch)
    }

    pub fn next_sample(&mut self) -> Quaternion {
        let (yaw, pitch) = self.angles_at(self.tick);
        self.tick += 1;
        from_euler(EulerAngles::new(0.0, deg_to_rad(pitch), deg_to_rad(yaw)))
    }

    /// Push samples into `sink` at the configured rate until the pipeline
    /// goes away.
    pub fn spawn(mut self, sink: SampleSink) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = Duration::from_secs_f64(1.0 / self.sample_hz as f64);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                sample_hz = self.sample_hz,
                yaw_step_deg = self.yaw_step_deg,
                "Simulated head-tracking source started"
            );

            loop {
                interval.tick().await;
                if sink.is_closed() {
                    break;
                }
                sink.push(self.next_sample());
            }
            tracing::info!(samples = self.tick, "Simulated source stopped");
        })
    }
}

/// Wrap degrees into (-180, 180].
fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
