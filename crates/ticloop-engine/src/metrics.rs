//! Per-frame and cumulative scheduler metrics.
//!
//! [`FrameMetrics`] describes a single [`try_run_tics`] call;
//! [`SchedulerMetrics`] accumulates counters over the session's lifetime.
//!
//! [`try_run_tics`]: crate::LockstepScheduler::try_run_tics

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Wall-clock time for the whole frame, in microseconds.
    pub total_us: u64,
    /// Real tics elapsed since the previous frame.
    pub real_tics: i64,
    /// Complete tics ready when the frame decided its count.
    pub available: u64,
    /// Tics the frame decided to run.
    pub count: u64,
    /// Tics actually run (less than `count` if the session ended).
    pub tics_run: u64,
    /// Simulation steps run (`tics_run * ticdup`).
    pub steps_run: u64,
    /// Local tics produced during the frame.
    pub produced: u64,
    /// Times the frame blocked on the transport waiting for input.
    pub wait_polls: u32,
}

/// Counters accumulated over the whole session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerMetrics {
    /// Frames run.
    pub frames: u64,
    /// Tics run.
    pub tics_run: u64,
    /// Frames abandoned by the stall guard.
    pub stalls: u64,
    /// Pump calls where the producer refused before meeting the request.
    pub pacing_refusals: u64,
    /// Remote batches stored.
    pub batches_received: u64,
    /// Disconnect notices received.
    pub disconnects: u64,
    /// Outbound packets handed to the transport.
    pub packets_sent: u64,
    /// Clock-offset updates applied.
    pub clock_adjustments: u64,
    /// Pacing clock rewinds from drift correction.
    pub drift_rewinds: u64,
    /// Tics dropped by drift correction.
    pub drift_skips: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let f = FrameMetrics::default();
        assert_eq!(f.total_us, 0);
        assert_eq!(f.count, 0);
        assert_eq!(f.wait_polls, 0);

        let s = SchedulerMetrics::default();
        assert_eq!(s.frames, 0);
        assert_eq!(s.stalls, 0);
        assert_eq!(s.packets_sent, 0);
    }
}
