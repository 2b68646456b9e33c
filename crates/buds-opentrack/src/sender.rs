use crate::throttle::Throttle;
use crate::wire;
use buds_pose::HeadPose;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Could not resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} resolved to no addresses")]
    NoAddress(String),
    #[error("Failed to bind UDP socket: {0}")]
    Bind(#[source] io::Error),
    #[error("Port {} is already in use (is the head-tracking consumer already listening?)", .0.port())]
    AddrInUse(SocketAddr),
}

/// Datagram sink for encoded frames.
pub trait Transport {
    /// Send one frame as one datagram. Must not block.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Unconnected, non-blocking UDP socket aimed at a fixed destination.
///
/// The socket is opened in [`UdpTransport::connect`] and closed when the
/// transport is dropped.
pub struct UdpTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTransport {
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = format!("{host}:{port}");
        let destination = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                target: target.clone(),
                source,
            })?
            .next()
            .ok_or(TransportError::NoAddress(target))?;

        let bind_addr: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).map_err(TransportError::Bind)?;
        socket.set_nonblocking(true).map_err(TransportError::Bind)?;

        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(frame, self.destination)?;
        if n != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {n} of {} bytes", frame.len()),
            ));
        }
        Ok(())
    }
}

/// Counters kept by [`OpenTrackSender`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    pub sent: u64,
    pub throttled: u64,
    pub failed: u64,
}

/// Rate-limited OpenTrack frame sender.
pub struct OpenTrackSender<T: Transport = UdpTransport> {
    transport: T,
    throttle: Throttle,
    stats: SendStats,
}

impl OpenTrackSender<UdpTransport> {
    /// Open the UDP socket for `host:port` and send at most `target_hz` frames
    /// per second.
    pub fn connect(host: &str, port: u16, target_hz: u32) -> Result<Self, TransportError> {
        let transport = UdpTransport::connect(host, port)?;
        tracing::info!(
            destination = %transport.destination(),
            target_hz,
            "OpenTrack UDP sender initialized"
        );
        Ok(Self::new(transport, target_hz))
    }
}

impl<T: Transport> OpenTrackSender<T> {
    pub fn new(transport: T, target_hz: u32) -> Self {
        Self {
            transport,
            throttle: Throttle::from_rate_hz(target_hz),
            stats: SendStats::default(),
        }
    }

    /// Send `pose` unless the previous frame went out less than one interval
    /// ago. Returns whether a frame was sent.
    ///
    /// Transport failures are logged and reported as `false`; the throttle
    /// clock only restarts on success.
    pub fn try_send(&mut self, pose: &HeadPose) -> bool {
        self.try_send_at(pose, Instant::now())
    }

    pub fn try_send_at(&mut self, pose: &HeadPose, now: Instant) -> bool {
        if !self.throttle.is_ready(now) {
            self.stats.throttled += 1;
            tracing::trace!("Frame throttled");
            return false;
        }

        let frame = wire::encode_pose(pose);
        match self.transport.send(&frame) {
            Ok(()) => {
                self.throttle.mark_sent(now);
                self.stats.sent += 1;
                true
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(?e, "Failed to send UDP frame");
                false
            }
        }
    }

    pub fn stats(&self) -> SendStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Drop for OpenTrackSender<T> {
    fn drop(&mut self) {
        tracing::info!(
            sent = self.stats.sent,
            failed = self.stats.failed,
            "OpenTrack UDP sender closed"
        );
    }
}
