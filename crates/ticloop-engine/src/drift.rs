//! Adaptive-mode drift correction between peers.
//!
//! Local production should stay one to three tics above what has been
//! received. A non-key participant that keeps falling behind speeds its
//! pacing clock up by one tic; one that stays ahead for four consecutive
//! frames drops a tic. The key participant (lowest active slot) is the
//! reference and never adapts.

use log::debug;
use ticloop_core::TicIndex;

use crate::pump::PacingPump;
use crate::session::SessionContext;

/// Frames of history consulted before dropping a tic.
const HISTORY: usize = 4;

/// Rolling record of whether this participant ran ahead of the network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriftCorrector {
    frame_on: usize,
    frame_skip: [bool; HISTORY],
    old_net_tics: TicIndex,
}

/// What a [`DriftCorrector::update`] call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriftAdjustment {
    /// The pacing clock was pulled back one tic.
    pub rewound: bool,
    /// One tic of debt was imposed.
    pub skipped: bool,
}

impl DriftCorrector {
    /// A corrector with empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame and nudge the pump if this participant drifted.
    pub fn update(&mut self, session: &SessionContext, pump: &mut PacingPump) -> DriftAdjustment {
        let mut adjustment = DriftAdjustment::default();
        self.frame_on = self.frame_on.wrapping_add(1);

        let Some(key) = session.key_participant() else {
            return adjustment;
        };
        if key == session.params.local {
            return adjustment;
        }

        let cursors = session.cursors;
        if cursors.produced <= cursors.received {
            pump.rewind();
            adjustment.rewound = true;
        }

        self.frame_skip[self.frame_on % HISTORY] = self.old_net_tics > cursors.received;
        self.old_net_tics = cursors.produced;

        if self.frame_skip.iter().all(|&s| s) {
            pump.set_skip(1);
            adjustment.skipped = true;
            debug!(
                "running ahead of the network (produced {}, received {}), skipping a tic",
                cursors.produced, cursors.received
            );
        }
        adjustment
    }
}
