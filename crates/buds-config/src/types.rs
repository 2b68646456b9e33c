use anyhow::{bail, Result};
use buds_pose::RemapMode;
use serde::{Deserialize, Serialize};

/// Highest send rate accepted. Above this the interval drops below 1 ms.
pub const MAX_TARGET_HZ: u32 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OpenTrack UDP output.
    pub transport: TransportConfig,
    /// Axis conventions.
    pub mapping: MappingConfig,
    /// Synthetic sample source used by the `simulate` mode.
    pub simulation: SimulationConfig,
    /// Frame listener used by the `listen` mode.
    pub listener: ListenerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transport.target_hz == 0 || self.transport.target_hz > MAX_TARGET_HZ {
            bail!(
                "transport.target_hz must be between 1 and {MAX_TARGET_HZ}, got {}",
                self.transport.target_hz
            );
        }
        if self.transport.host.trim().is_empty() {
            bail!("transport.host must not be empty");
        }
        if self.mapping.modes.is_empty() {
            bail!("mapping.modes must list at least one mode");
        }
        if !self.mapping.modes.contains(&self.mapping.initial) {
            bail!(
                "mapping.initial ({}) is not one of mapping.modes",
                self.mapping.initial
            );
        }
        if self.simulation.sample_hz == 0 {
            bail!("simulation.sample_hz must be at least 1");
        }
        if !self.simulation.yaw_step_deg.is_finite()
            || !self.simulation.pitch_amplitude_deg.is_finite()
        {
            bail!("simulation angles must be finite");
        }
        if self.listener.report_every == 0 {
            bail!("listener.report_every must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host running the head-tracking consumer.
    pub host: String,
    /// OpenTrack "UDP over network" port.
    pub port: u16,
    /// Maximum frames per second. Extra samples are dropped.
    pub target_hz: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4242,
            target_hz: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Modes visited by "cycle mode", in order.
    pub modes: Vec<RemapMode>,
    /// Mode active at startup.
    pub initial: RemapMode,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            modes: RemapMode::ALL.to_vec(),
            initial: RemapMode::BudsSwapped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Samples generated per second.
    pub sample_hz: u32,
    /// Yaw advance per sample, degrees.
    pub yaw_step_deg: f64,
    /// Peak pitch of the nodding motion, degrees.
    pub pitch_amplitude_deg: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sample_hz: 100,
            yaw_step_deg: 0.5,
            pitch_amplitude_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    pub port: u16,
    /// Log one line per this many received frames.
    pub report_every: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 4242,
            report_every: 10,
        }
    }
}
