use buds_pose::HeadPose;
use thiserror::Error;

/// Number of f64 values in one frame: x, y, z, yaw, pitch, roll.
pub const FRAME_VALUES: usize = 6;
/// Size of one OpenTrack UDP frame in bytes.
pub const FRAME_LEN: usize = FRAME_VALUES * 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("Frame has {0} bytes, expected {FRAME_LEN}")]
    WrongLength(usize),
}

/// Decoded OpenTrack frame. Position is in centimeters, rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Frame {
    /// Rotation-only frame for `pose`. Position stays at the origin.
    pub fn from_pose(pose: &HeadPose) -> Self {
        Self {
            yaw: pose.yaw,
            pitch: pose.pitch,
            roll: pose.roll,
            ..Self::default()
        }
    }

    pub fn values(&self) -> [f64; FRAME_VALUES] {
        [self.x, self.y, self.z, self.yaw, self.pitch, self.roll]
    }
}

/// Serialize `pose` as six little-endian doubles. No header, no length
/// prefix: the datagram is the frame.
pub fn encode_pose(pose: &HeadPose) -> [u8; FRAME_LEN] {
    encode_frame(&Frame::from_pose(pose))
}

pub fn encode_frame(frame: &Frame) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    for (chunk, value) in out.chunks_exact_mut(8).zip(frame.values()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode_frame(data: &[u8]) -> Result<Frame, WireError> {
    if data.len() != FRAME_LEN {
        return Err(WireError::WrongLength(data.len()));
    }

    let f = |index: usize| -> f64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&data[index * 8..index * 8 + 8]);
        f64::from_le_bytes(bytes)
    };

    Ok(Frame {
        x: f(0),
        y: f(1),
        z: f(2),
        yaw: f(3),
        pitch: f(4),
        roll: f(5),
    })
}
