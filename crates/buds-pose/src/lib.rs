//! Orientation-to-pose core: quaternion decomposition, axis remapping and
//! recenter calibration for earbud head tracking.

pub mod euler;
pub mod mapper;
pub mod remap;
pub mod types;

pub use euler::EulerAngles;
pub use mapper::OrientationMapper;
pub use remap::{RemapMode, RemapTransform};
pub use types::{now_millis, HeadPose, Quaternion};
