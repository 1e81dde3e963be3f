//! Remote command intake.

use log::{info, trace, warn};
use ticloop_core::RemoteBatch;

use crate::session::SessionContext;

/// Store a remote batch at slot `received` and advance `received`.
///
/// `None` is the disconnect notice: no tic data is written and `received`
/// does not move, but the session stops waiting on remote intake and
/// continues on local production alone.
///
/// The local participant's column is never written here; local commands
/// come only from the local producer. A drone has no local column, so
/// every column is copied.
///
/// A batch is refused, and `false` returned, when every ring slot still
/// holds a tic the simulation has not run. The disconnect notice is
/// always accepted.
pub fn receive_batch(session: &mut SessionContext, batch: Option<&RemoteBatch>) -> bool {
    let Some(batch) = batch else {
        if session.connected {
            info!(
                "transport disconnected at received tic {}",
                session.cursors.received
            );
        }
        session.connected = false;
        return true;
    };

    if !session.intake_has_room() {
        warn!(
            "remote intake full: refusing tic {} (simulation at tic {})",
            session.cursors.received,
            session.simulated_tic()
        );
        return false;
    }

    let keep = (!session.params.drone).then_some(session.params.local);
    let tic = session.cursors.received;
    session.ring.store_remote(tic, keep, batch);
    session.cursors.received = tic.next();
    trace!("received remote tic {tic}");
    true
}
