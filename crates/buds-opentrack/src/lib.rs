//! OpenTrack UDP output: six little-endian doubles per datagram, sent at a
//! bounded rate.

pub mod listener;
pub mod sender;
pub mod throttle;
pub mod wire;

pub use listener::{FrameCounter, FrameListener, ReceivedFrame};
pub use sender::{OpenTrackSender, SendStats, Transport, TransportError, UdpTransport};
pub use throttle::Throttle;
pub use wire::{decode_frame, encode_pose, Frame, WireError, FRAME_LEN};
