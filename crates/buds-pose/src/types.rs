use glam::DQuat;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Orientation sample as delivered by the earbuds (x, y, z, w).
///
/// Not necessarily unit length. Normalize before use.
pub type Quaternion = DQuat;

/// Head orientation in the OpenTrack convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    /// Degrees.
    pub yaw: f64,
    /// Degrees.
    pub pitch: f64,
    /// Degrees.
    pub roll: f64,
    /// Unix time in milliseconds when the pose was produced.
    pub timestamp_millis: i64,
}

impl HeadPose {
    pub fn new(yaw: f64, pitch: f64, roll: f64, timestamp_millis: i64) -> Self {
        Self {
            yaw,
            pitch,
            roll,
            timestamp_millis,
        }
    }

    /// Pose with all rotation channels at zero.
    pub fn zeroed(timestamp_millis: i64) -> Self {
        Self::new(0.0, 0.0, 0.0, timestamp_millis)
    }

    pub fn is_zero_rotation(&self) -> bool {
        self.yaw == 0.0 && self.pitch == 0.0 && self.roll == 0.0
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::zeroed(0)
    }
}

impl fmt::Display for HeadPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Yaw={:.2}° Pitch={:.2}° Roll={:.2}°",
            self.yaw, self.pitch, self.roll
        )
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
