use crate::euler;
use crate::remap::RemapMode;
use crate::types::{now_millis, HeadPose, Quaternion};

/// Squared length below which a sample carries no usable orientation.
const MIN_LENGTH_SQUARED: f64 = 1e-3;

/// Converts raw earbud quaternions into OpenTrack head poses.
///
/// Owns the recenter reference and the active axis convention. Not shared:
/// the pipeline task holds the only instance and applies control requests
/// between samples.
pub struct OrientationMapper {
    /// Modes visited by [`OrientationMapper::cycle_mode`], in order.
    modes: Vec<RemapMode>,
    /// Index of the active mode in `modes`.
    active: usize,
    calibration: CalibrationState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CalibrationState {
    Uncalibrated,
    /// Reference orientation, normalized and expressed in the active mode's
    /// frame.
    Calibrated { reference: Quaternion },
}

impl OrientationMapper {
    /// Mapper cycling through `modes`, starting at `initial`.
    ///
    /// An empty list falls back to [`RemapMode::ALL`]. If `initial` is not in
    /// the list the first entry is used.
    pub fn new(modes: Vec<RemapMode>, initial: RemapMode) -> Self {
        let modes = if modes.is_empty() {
            RemapMode::ALL.to_vec()
        } else {
            modes
        };
        let active = modes.iter().position(|&m| m == initial).unwrap_or(0);
        Self {
            modes,
            active,
            calibration: CalibrationState::Uncalibrated,
        }
    }

    /// Mapper fixed to a single mode.
    pub fn with_mode(mode: RemapMode) -> Self {
        Self::new(vec![mode], mode)
    }

    pub fn mode(&self) -> RemapMode {
        self.modes[self.active]
    }

    pub fn modes(&self) -> &[RemapMode] {
        &self.modes
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.calibration, CalibrationState::Calibrated { .. })
    }

    /// Convert a raw sample, stamped with the current time.
    pub fn convert(&self, q: Quaternion) -> HeadPose {
        self.convert_at(q, now_millis())
    }

    /// Convert a raw sample with an explicit timestamp.
    ///
    /// Non-finite or near-zero samples produce a zero pose rather than an
    /// error so the stream keeps flowing.
    pub fn convert_at(&self, q: Quaternion, timestamp_millis: i64) -> HeadPose {
        if !is_usable(q) {
            tracing::trace!(?q, "Substituting zero pose for unusable sample");
            return HeadPose::zeroed(timestamp_millis);
        }

        let transform = self.mode().transform();
        let mapped = transform.apply(q);

        // Conjugate is enough: the reference is normalized.
        let relative = match self.calibration {
            CalibrationState::Calibrated { reference } => reference.conjugate() * mapped,
            CalibrationState::Uncalibrated => mapped,
        };

        let angles = euler::to_euler(relative).to_degrees();
        let (yaw, pitch, roll) = transform.assign(angles.yaw, angles.pitch, angles.roll);

        HeadPose::new(yaw, pitch, roll, timestamp_millis)
    }

    /// Use `q` as the new center. Degenerate samples are ignored.
    pub fn recenter(&mut self, q: Quaternion) {
        if !is_usable(q) {
            tracing::debug!(?q, "Ignoring recenter on degenerate sample");
            return;
        }
        let reference = self.mode().transform().apply(q.normalize());
        self.calibration = CalibrationState::Calibrated { reference };
        tracing::info!(mode = %self.mode(), "Re-centered head tracking");
    }

    /// Drop the recenter reference.
    pub fn clear_recenter(&mut self) {
        self.calibration = CalibrationState::Uncalibrated;
        tracing::info!("Cleared re-center calibration");
    }

    /// Advance to the next mode, wrapping around, and return it.
    ///
    /// Clears the recenter reference: it was captured in the previous mode's
    /// frame and would make the output jump.
    pub fn cycle_mode(&mut self) -> RemapMode {
        self.active = (self.active + 1) % self.modes.len();
        self.calibration = CalibrationState::Uncalibrated;
        let mode = self.mode();
        tracing::info!(%mode, "Axis mapping changed, calibration cleared");
        mode
    }
}

impl Default for OrientationMapper {
    fn default() -> Self {
        Self::new(RemapMode::ALL.to_vec(), RemapMode::BudsSwapped)
    }
}

fn is_usable(q: Quaternion) -> bool {
    q.is_finite() && q.length_squared() >= MIN_LENGTH_SQUARED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euler::{deg_to_rad, from_euler, EulerAngles};

    const TOL_DEG: f64 = 1e-3;

    fn sample() -> Quaternion {
        from_euler(EulerAngles::new(
            deg_to_rad(12.0),
            deg_to_rad(-20.0),
            deg_to_rad(35.0),
        ))
    }

    fn assert_zero(pose: HeadPose) {
        assert!(pose.yaw.abs() < TOL_DEG, "yaw {}", pose.yaw);
        assert!(pose.pitch.abs() < TOL_DEG, "pitch {}", pose.pitch);
        assert!(pose.roll.abs() < TOL_DEG, "roll {}", pose.roll);
    }

    #[test]
    fn identity_is_zero_in_every_mode() {
        for mode in RemapMode::ALL {
            let mapper = OrientationMapper::with_mode(mode);
            assert_zero(mapper.convert(Quaternion::IDENTITY));
        }
    }

    #[test]
    fn recenter_zeroes_same_sample_in_every_mode() {
        let q = sample();
        for mode in RemapMode::ALL {
            let mut mapper = OrientationMapper::with_mode(mode);
            mapper.recenter(q);
            assert!(mapper.is_calibrated());
            assert_zero(mapper.convert(q));
        }
    }

    #[test]
    fn recenter_accepts_non_unit_reference() {
        let q = sample();
        let scaled = Quaternion::from_xyzw(q.x * 2.5, q.y * 2.5, q.z * 2.5, q.w * 2.5);
        let mut mapper = OrientationMapper::default();
        mapper.recenter(scaled);
        assert_zero(mapper.convert(q));
    }

    #[test]
    fn cycle_mode_clears_calibration() {
        let q = sample();
        let mut mapper = OrientationMapper::default();
        mapper.recenter(q);
        let mode = mapper.cycle_mode();
        assert!(!mapper.is_calibrated());

        let fresh = OrientationMapper::with_mode(mode);
        let a = mapper.convert_at(q, 7);
        let b = fresh.convert_at(q, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn cycle_mode_wraps() {
        let mut mapper = OrientationMapper::new(
            vec![RemapMode::Passthrough, RemapMode::YUp],
            RemapMode::YUp,
        );
        assert_eq!(mapper.mode(), RemapMode::YUp);
        assert_eq!(mapper.cycle_mode(), RemapMode::Passthrough);
        assert_eq!(mapper.cycle_mode(), RemapMode::YUp);
    }

    #[test]
    fn unknown_initial_mode_starts_at_first() {
        let mapper = OrientationMapper::new(vec![RemapMode::XUp], RemapMode::YUp);
        assert_eq!(mapper.mode(), RemapMode::XUp);
        let mapper = OrientationMapper::new(Vec::new(), RemapMode::YUp);
        assert_eq!(mapper.modes(), &RemapMode::ALL);
        assert_eq!(mapper.mode(), RemapMode::YUp);
    }

    #[test]
    fn clear_recenter_restores_absolute_output() {
        let q = sample();
        let mut mapper = OrientationMapper::default();
        let absolute = mapper.convert_at(q, 1);
        mapper.recenter(q);
        mapper.clear_recenter();
        assert!(!mapper.is_calibrated());
        assert_eq!(mapper.convert_at(q, 1), absolute);
    }

    #[test]
    fn degenerate_recenter_keeps_previous_reference() {
        let q = sample();
        let mut mapper = OrientationMapper::default();
        mapper.recenter(q);
        mapper.recenter(Quaternion::from_xyzw(0.0, 0.0, 0.01, 0.0));
        assert!(mapper.is_calibrated());
        assert_zero(mapper.convert(q));

        let mut fresh = OrientationMapper::default();
        fresh.recenter(Quaternion::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert!(!fresh.is_calibrated());
    }

    #[test]
    fn non_finite_sample_yields_zero_pose() {
        let mapper = OrientationMapper::default();
        let pose = mapper.convert_at(Quaternion::from_xyzw(f64::NAN, 0.0, 0.0, 1.0), 42);
        assert!(pose.is_zero_rotation());
        assert_eq!(pose.timestamp_millis, 42);

        let pose = mapper.convert(Quaternion::from_xyzw(0.0, f64::INFINITY, 0.0, 1.0));
        assert!(pose.is_zero_rotation());
    }

    #[test]
    fn relative_rotation_after_recenter() {
        // Center at 30° yaw, then turn to 50°: 20° remains.
        let mut mapper = OrientationMapper::with_mode(RemapMode::Passthrough);
        mapper.recenter(Quaternion::from_rotation_z(deg_to_rad(30.0)));
        let pose = mapper.convert(Quaternion::from_rotation_z(deg_to_rad(50.0)));
        assert!((pose.yaw - 20.0).abs() < TOL_DEG);
        assert!(pose.pitch.abs() < TOL_DEG);
        assert!(pose.roll.abs() < TOL_DEG);
    }

    #[test]
    fn buds_swapped_routes_sensor_roll_to_yaw() {
        let mapper = OrientationMapper::with_mode(RemapMode::BudsSwapped);
        let pose = mapper.convert(Quaternion::from_rotation_x(deg_to_rad(25.0)));
        assert!((pose.yaw - 25.0).abs() < TOL_DEG);
        assert!(pose.roll.abs() < TOL_DEG);

        let pose = mapper.convert(Quaternion::from_rotation_y(deg_to_rad(15.0)));
        assert!((pose.pitch + 15.0).abs() < TOL_DEG);
    }

    #[test]
    fn timestamp_is_wall_clock() {
        let before = now_millis();
        let pose = OrientationMapper::default().convert(sample());
        let after = now_millis();
        assert!(pose.timestamp_millis >= before && pose.timestamp_millis <= after);
    }
}
