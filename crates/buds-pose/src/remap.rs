use crate::types::Quaternion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis convention applied to raw samples before decomposition.
///
/// Each mode is a fixed change of basis on the sensor frame followed by an
/// assignment of the decomposed angles to the OpenTrack channels. The correct
/// mode depends on how the sensor sits in the ear, so the set that
/// [`crate::OrientationMapper`] cycles through comes from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemapMode {
    /// Sensor frame used as-is.
    Passthrough,
    /// Sensor frame as-is, yaw and roll channels exchanged, pitch inverted.
    /// Galaxy Buds report head turns on their roll axis.
    BudsSwapped,
    /// Sensor reports Y up: (x, y, z) -> (x, -z, y).
    YUp,
    /// Sensor reports X up: (x, y, z) -> (y, z, x).
    XUp,
}

/// Signed source axis for each output axis: `±1` = x, `±2` = y, `±3` = z.
type AxisTable = [i8; 3];

const IDENTITY_AXES: AxisTable = [1, 2, 3];
const Y_UP_AXES: AxisTable = [1, -3, 2];
const X_UP_AXES: AxisTable = [2, 3, 1];

/// Resolved transform for one [`RemapMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapTransform {
    axes: AxisTable,
    /// Exchange the yaw and roll output channels.
    pub swap_yaw_roll: bool,
    /// Negate the pitch output channel.
    pub invert_pitch: bool,
}

impl RemapMode {
    /// Every mode, in default cycling order.
    pub const ALL: [RemapMode; 4] = [
        RemapMode::Passthrough,
        RemapMode::BudsSwapped,
        RemapMode::YUp,
        RemapMode::XUp,
    ];

    pub fn transform(self) -> RemapTransform {
        match self {
            RemapMode::Passthrough => RemapTransform {
                axes: IDENTITY_AXES,
                swap_yaw_roll: false,
                invert_pitch: false,
            },
            RemapMode::BudsSwapped => RemapTransform {
                axes: IDENTITY_AXES,
                swap_yaw_roll: true,
                invert_pitch: true,
            },
            RemapMode::YUp => RemapTransform {
                axes: Y_UP_AXES,
                swap_yaw_roll: false,
                invert_pitch: false,
            },
            RemapMode::XUp => RemapTransform {
                axes: X_UP_AXES,
                swap_yaw_roll: false,
                invert_pitch: false,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RemapMode::Passthrough => "passthrough",
            RemapMode::BudsSwapped => "buds_swapped",
            RemapMode::YUp => "y_up",
            RemapMode::XUp => "x_up",
        }
    }
}

impl fmt::Display for RemapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl RemapTransform {
    /// Express `q` in the remapped frame.
    ///
    /// Every axis table is a proper rotation, so the vector part permutes like
    /// an ordinary vector and `w` is untouched.
    pub fn apply(&self, q: Quaternion) -> Quaternion {
        let v = [q.x, q.y, q.z];
        let pick = |entry: i8| {
            let value = v[(entry.unsigned_abs() - 1) as usize];
            if entry < 0 {
                -value
            } else {
                value
            }
        };
        Quaternion::from_xyzw(
            pick(self.axes[0]),
            pick(self.axes[1]),
            pick(self.axes[2]),
            q.w,
        )
    }

    /// Assign decomposed (yaw, pitch, roll) degrees to output channels.
    pub fn assign(&self, yaw: f64, pitch: f64, roll: f64) -> (f64, f64, f64) {
        let pitch = if self.invert_pitch { -pitch } else { pitch };
        if self.swap_yaw_roll {
            (roll, pitch, yaw)
        } else {
            (yaw, pitch, roll)
        }
    }

    #[cfg(test)]
    fn determinant(&self) -> i32 {
        let mut m = [[0i32; 3]; 3];
        for (row, &entry) in self.axes.iter().enumerate() {
            let col = (entry.unsigned_abs() - 1) as usize;
            m[row][col] = entry.signum() as i32;
        }
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_axis_table_is_a_proper_rotation() {
        for mode in RemapMode::ALL {
            assert_eq!(mode.transform().determinant(), 1, "{mode}");
        }
    }

    #[test]
    fn identity_stays_identity() {
        for mode in RemapMode::ALL {
            let q = mode.transform().apply(Quaternion::IDENTITY);
            assert_eq!(q, Quaternion::IDENTITY, "{mode}");
        }
    }

    #[test]
    fn y_up_moves_vertical_axis_to_z() {
        // Rotation about the sensor's Y (its vertical) becomes rotation about Z.
        let q = Quaternion::from_rotation_y(0.5);
        let mapped = RemapMode::YUp.transform().apply(q);
        let expected = Quaternion::from_rotation_z(0.5);
        assert!(mapped.dot(expected) > 1.0 - 1e-12);
    }

    #[test]
    fn x_up_moves_vertical_axis_to_z() {
        let q = Quaternion::from_rotation_x(0.5);
        let mapped = RemapMode::XUp.transform().apply(q);
        let expected = Quaternion::from_rotation_z(0.5);
        assert!(mapped.dot(expected) > 1.0 - 1e-12);
    }

    #[test]
    fn buds_swapped_assignment() {
        let t = RemapMode::BudsSwapped.transform();
        assert_eq!(t.assign(10.0, 20.0, 30.0), (30.0, -20.0, 10.0));

        let t = RemapMode::Passthrough.transform();
        assert_eq!(t.assign(10.0, 20.0, 30.0), (10.0, 20.0, 30.0));
    }

    #[test]
    fn names_match_serde() {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        for mode in RemapMode::ALL {
            let de: StrDeserializer<'_, Error> = mode.name().into_deserializer();
            assert_eq!(RemapMode::deserialize(de).unwrap(), mode);
        }
    }
}
