//! Local command production, one tic slot at a time.

use log::trace;
use ticloop_core::{SimulationEngine, TicCmd};

use crate::config::SyncMode;
use crate::session::SessionContext;

/// Fixed-availability soft limit: production refuses once the local
/// lead exceeds this.
pub const SOFT_AHEAD_LIMIT: i64 = 2;

/// Fixed-availability hard limit, about 200 ms at 35 Hz.
pub const HARD_AHEAD_LIMIT: i64 = 8;

/// Adaptive-mode limit: production refuses once this far ahead.
pub const ADAPTIVE_AHEAD_LIMIT: i64 = 5;

/// Whether pacing allows the local producer to fill another slot.
pub fn may_produce(session: &SessionContext) -> bool {
    if session.params.drone {
        return false;
    }
    let ahead = session.ahead_by();
    match session.params.sync_mode {
        SyncMode::FixedAvailability => {
            if ahead > SOFT_AHEAD_LIMIT {
                return false;
            }
            ahead <= HARD_AHEAD_LIMIT
        }
        SyncMode::Adaptive => ahead < ADAPTIVE_AHEAD_LIMIT,
    }
}

/// Sample local input and, if pacing allows, store one new local command.
///
/// Input sampling and menu processing run on every call, refused or not,
/// so the menu stays responsive while the simulation waits. On success
/// the command is stored at the local column of slot `produced`, the
/// local participant is marked present there, and `produced` advances.
/// Never blocks.
pub fn produce_one_tic<E: SimulationEngine>(session: &mut SessionContext, engine: &mut E) -> bool {
    engine.sample_input();
    engine.advance_menu();

    if !may_produce(session) {
        return false;
    }

    let tic = session.cursors.produced;
    let mut cmd = TicCmd::default();
    engine.fill_command(&mut cmd, tic);
    session.ring.store_local(tic, session.params.local, cmd);
    session.cursors.produced = tic.next();
    trace!("produced local tic {tic}");
    true
}
