use buds_pose::{OrientationMapper, Quaternion};

/// Control requests from the user side of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    /// Use the next sample as the new center.
    Recenter,
    ClearRecenter,
    /// Switch to the next axis mapping.
    CycleMode,
}

/// Requests waiting for the next sample.
///
/// Requests are only applied between samples, on the task that owns the
/// mapper, so calibration never changes under a conversion in progress.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingControl {
    recenter: bool,
    clear: bool,
    cycle: bool,
}

impl PendingControl {
    pub fn request(&mut self, command: TrackingCommand) {
        tracing::debug!(?command, "Control request queued for next sample");
        match command {
            TrackingCommand::Recenter => self.recenter = true,
            TrackingCommand::ClearRecenter => {
                // A clear supersedes an earlier recenter nobody has seen yet.
                self.recenter = false;
                self.clear = true;
            }
            TrackingCommand::CycleMode => self.cycle = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.recenter || self.clear || self.cycle)
    }

    /// Apply and consume pending requests. Cycling happens first, so a
    /// recenter requested alongside it is captured in the new mode.
    pub fn apply(&mut self, mapper: &mut OrientationMapper, sample: Quaternion) {
        let pending = std::mem::take(self);
        if pending.cycle {
            mapper.cycle_mode();
        }
        if pending.clear {
            mapper.clear_recenter();
        }
        if pending.recenter {
            mapper.recenter(sample);
        }
    }
}
