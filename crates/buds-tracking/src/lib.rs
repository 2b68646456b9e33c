pub mod control;
pub mod simulate;

pub use control::{PendingControl, TrackingCommand};

use buds_opentrack::{OpenTrackSender, SendStats, Transport};
use buds_pose::{HeadPose, OrientationMapper, Quaternion, RemapMode};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Samples buffered between the sensor callback and the pipeline task.
/// When full, new samples are dropped.
const SAMPLE_QUEUE_DEPTH: usize = 16;

/// Log a heartbeat every this many sent frames.
const HEARTBEAT_FRAMES: u64 = 10;

/// Snapshot of pipeline state, published after every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStats {
    pub samples: u64,
    pub send: SendStats,
    pub mode: RemapMode,
    pub calibrated: bool,
}

impl TrackingStats {
    fn new(mapper: &OrientationMapper) -> Self {
        Self {
            samples: 0,
            send: SendStats::default(),
            mode: mapper.mode(),
            calibrated: mapper.is_calibrated(),
        }
    }
}

/// Producer handle for orientation samples.
#[derive(Clone)]
pub struct SampleSink {
    tx: mpsc::Sender<Quaternion>,
}

impl SampleSink {
    /// Hand a sample to the pipeline without waiting. Returns `false` if the
    /// sample was dropped.
    pub fn push(&self, q: Quaternion) -> bool {
        match self.tx.try_send(q) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!("Pipeline busy, dropping sample");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Head-tracking pipeline: samples in, OpenTrack frames out.
///
/// The mapper and sender live on a background task. Samples come in through
/// [`SampleSink`]s, control requests through the methods below, and the
/// latest pose is published for display.
pub struct TrackingClient {
    pose_rx: watch::Receiver<HeadPose>,
    stats_rx: watch::Receiver<TrackingStats>,
    command_tx: mpsc::UnboundedSender<TrackingCommand>,
    sample_tx: mpsc::Sender<Quaternion>,
    task: JoinHandle<()>,
}

impl TrackingClient {
    /// Start the pipeline task. Must be called from within a tokio runtime.
    pub fn spawn<T>(mapper: OrientationMapper, sender: OpenTrackSender<T>) -> Self
    where
        T: Transport + Send + 'static,
    {
        let (pose_tx, pose_rx) = watch::channel(HeadPose::default());
        let (stats_tx, stats_rx) = watch::channel(TrackingStats::new(&mapper));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (sample_tx, sample_rx) = mpsc::channel(SAMPLE_QUEUE_DEPTH);

        tracing::info!(mode = %mapper.mode(), "Head-tracking pipeline started");

        let task = tokio::spawn(pipeline_loop(
            mapper, sender, sample_rx, command_rx, pose_tx, stats_tx,
        ));

        Self {
            pose_rx,
            stats_rx,
            command_tx,
            sample_tx,
            task,
        }
    }

    pub fn sample_sink(&self) -> SampleSink {
        SampleSink {
            tx: self.sample_tx.clone(),
        }
    }

    /// Latest pose produced (non-blocking).
    pub fn pose(&self) -> HeadPose {
        *self.pose_rx.borrow()
    }

    /// Receiver notified on every new pose.
    pub fn subscribe_pose(&self) -> watch::Receiver<HeadPose> {
        self.pose_rx.clone()
    }

    pub fn stats(&self) -> TrackingStats {
        *self.stats_rx.borrow()
    }

    /// Recenter on the next sample.
    pub fn recenter(&self) {
        self.command(TrackingCommand::Recenter);
    }

    pub fn clear_recenter(&self) {
        self.command(TrackingCommand::ClearRecenter);
    }

    pub fn cycle_mode(&self) {
        self.command(TrackingCommand::CycleMode);
    }

    pub fn command(&self, command: TrackingCommand) {
        let _ = self.command_tx.send(command);
    }

    /// Stop accepting requests and wait for the task. The task finishes once
    /// every [`SampleSink`] has been dropped.
    pub async fn shutdown(self) {
        let Self {
            sample_tx,
            command_tx,
            task,
            ..
        } = self;
        drop(sample_tx);
        drop(command_tx);
        if let Err(e) = task.await {
            tracing::error!(?e, "Pipeline task failed");
        }
    }
}

/// Measures the send rate between heartbeats.
#[derive(Debug, Clone, Copy)]
struct RateMeter {
    since: Instant,
    sent_at: u64,
}

impl RateMeter {
    fn new(now: Instant) -> Self {
        Self {
            since: now,
            sent_at: 0,
        }
    }

    /// Note the running `sent` count. On the first frame and every
    /// [`HEARTBEAT_FRAMES`] frames, returns the rate over the frames sent
    /// since the previous heartbeat (0 for the first).
    fn record(&mut self, sent: u64, now: Instant) -> Option<f64> {
        if sent != 1 && sent % HEARTBEAT_FRAMES != 0 {
            return None;
        }
        let frames = sent.saturating_sub(self.sent_at);
        let elapsed = now.saturating_duration_since(self.since).as_secs_f64();
        let rate_hz = if self.sent_at > 0 && elapsed > 0.0 {
            frames as f64 / elapsed
        } else {
            0.0
        };
        self.since = now;
        self.sent_at = sent;
        Some(rate_hz)
    }
}

/// Background task: apply pending control, convert, send, publish.
async fn pipeline_loop<T: Transport>(
    mut mapper: OrientationMapper,
    mut sender: OpenTrackSender<T>,
    mut sample_rx: mpsc::Receiver<Quaternion>,
    mut command_rx: mpsc::UnboundedReceiver<TrackingCommand>,
    pose_tx: watch::Sender<HeadPose>,
    stats_tx: watch::Sender<TrackingStats>,
) {
    let mut pending = PendingControl::default();
    let mut stats = TrackingStats::new(&mapper);
    let mut meter = RateMeter::new(Instant::now());

    loop {
        tokio::select! {
            // Requests first so one that arrived with a sample applies to it.
            biased;
            Some(command) = command_rx.recv() => pending.request(command),
            sample = sample_rx.recv() => {
                let Some(q) = sample else {
                    break;
                };

                pending.apply(&mut mapper, q);
                let pose = mapper.convert(q);
                stats.samples += 1;

                if sender.try_send(&pose) {
                    let sent = sender.stats().sent;
                    if let Some(rate_hz) = meter.record(sent, Instant::now()) {
                        tracing::debug!(
                            %pose,
                            rate_hz = %format!("{rate_hz:.1}"),
                            sent,
                            "Pipeline heartbeat"
                        );
                    }
                }

                stats.send = sender.stats();
                stats.mode = mapper.mode();
                stats.calibrated = mapper.is_calibrated();
                pose_tx.send_replace(pose);
                stats_tx.send_replace(stats);
            }
        }
    }

    tracing::info!(
        samples = stats.samples,
        sent = stats.send.sent,
        "Head-tracking pipeline stopped"
    );
}
