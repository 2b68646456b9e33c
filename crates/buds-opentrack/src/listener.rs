use crate::sender::TransportError;
use crate::wire::{self, Frame};
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::UdpSocket;

/// Largest datagram we bother to read. Anything longer is malformed anyway.
const MAX_DATAGRAM: usize = 1500;

/// One datagram as seen by the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReceivedFrame {
    Pose(Frame),
    /// Datagram of the given length that is not a frame.
    Malformed(usize),
}

/// Receives OpenTrack frames, for checking a running bridge without the
/// head-tracking consumer.
pub struct FrameListener {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl FrameListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            if e.kind() == io::ErrorKind::AddrInUse {
                TransportError::AddrInUse(addr)
            } else {
                TransportError::Bind(e)
            }
        })?;
        tracing::info!(%addr, "Listening for OpenTrack frames");
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait for the next datagram.
    pub async fn recv_frame(&mut self) -> io::Result<(ReceivedFrame, SocketAddr)> {
        let (n, from) = self.socket.recv_from(&mut self.buf).await?;
        let frame = match wire::decode_frame(&self.buf[..n]) {
            Ok(frame) => ReceivedFrame::Pose(frame),
            Err(_) => ReceivedFrame::Malformed(n),
        };
        Ok((frame, from))
    }

    /// Receive forever, logging every `report_every`-th frame with the
    /// average receive rate.
    pub async fn run(mut self, report_every: u64) -> io::Result<()> {
        let mut counter = FrameCounter::new(report_every, Instant::now());

        loop {
            match self.recv_frame().await? {
                (ReceivedFrame::Pose(frame), from) => {
                    if let Some(rate_hz) = counter.record_frame(Instant::now()) {
                        tracing::info!(
                            count = counter.received(),
                            %from,
                            yaw = %format!("{:.2}", frame.yaw),
                            pitch = %format!("{:.2}", frame.pitch),
                            roll = %format!("{:.2}", frame.roll),
                            rate_hz = %format!("{rate_hz:.1}"),
                            "Frame received"
                        );
                    }
                }
                (ReceivedFrame::Malformed(len), from) => {
                    let malformed = counter.record_malformed();
                    tracing::warn!(
                        len,
                        %from,
                        malformed,
                        "Skipping datagram that is not a frame"
                    );
                }
            }
        }
    }
}

/// Receive counters for [`FrameListener::run`].
#[derive(Debug, Clone)]
pub struct FrameCounter {
    report_every: u64,
    start: Instant,
    received: u64,
    malformed: u64,
}

impl FrameCounter {
    /// `report_every` of zero is treated as 1.
    pub fn new(report_every: u64, start: Instant) -> Self {
        Self {
            report_every: report_every.max(1),
            start,
            received: 0,
            malformed: 0,
        }
    }

    /// Count a frame. Every `report_every`-th frame returns the average rate
    /// since `start`.
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        self.received += 1;
        if self.received % self.report_every != 0 {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        Some(if elapsed > 0.0 {
            self.received as f64 / elapsed
        } else {
            0.0
        })
    }

    /// Count a malformed datagram and return the running total.
    pub fn record_malformed(&mut self) -> u64 {
        self.malformed += 1;
        self.malformed
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
