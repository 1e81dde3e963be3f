//! Per-frame pacing of local command production.
//!
//! [`PacingPump`] turns clock progress into a number of tics to produce,
//! carrying a signed debt counter so that skipped or rewound tics are
//! neither lost nor double-counted across frames.

use ticloop_core::{SimulationEngine, TimeSource};

use crate::clock::TicClock;
use crate::producer::produce_one_tic;
use crate::session::SessionContext;

/// What one [`PacingPump::pump`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpOutcome {
    /// Tics the clock said were due.
    pub requested: u64,
    /// Tics actually produced before the first refusal.
    pub produced: u64,
}

impl PumpOutcome {
    /// Whether the producer refused before the request was met.
    pub fn refused(&self) -> bool {
        self.produced < self.requested
    }
}

/// The pacing clock and its tic-debt counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacingPump {
    last_time: i64,
    skip: i64,
}

impl PacingPump {
    /// A pump whose clock starts at `now` (tics / ticdup) with no debt.
    pub fn new(now: i64) -> Self {
        Self {
            last_time: now,
            skip: 0,
        }
    }

    /// Restart the pacing clock at `now` without touching the debt.
    pub fn resync(&mut self, now: i64) {
        self.last_time = now;
    }

    /// Advance the pacing clock to `now` and return how many tics are due.
    ///
    /// Pays the outstanding debt out of the elapsed time first. If the
    /// debt exceeds the elapsed time it is reduced and nothing is due.
    pub fn tics_due(&mut self, now: i64) -> u64 {
        let elapsed = now - self.last_time;
        self.last_time = now;

        if self.skip <= elapsed {
            let due = elapsed - self.skip;
            self.skip = 0;
            // elapsed >= skip here, so due is non-negative.
            due as u64
        } else {
            self.skip -= elapsed;
            0
        }
    }

    /// Produce the tics that are due, stopping at the first refusal.
    pub fn pump<E, C>(
        &mut self,
        clock: &mut TicClock<C>,
        session: &mut SessionContext,
        engine: &mut E,
    ) -> PumpOutcome
    where
        E: SimulationEngine,
        C: TimeSource,
    {
        let now = clock.adjusted_tics().div_euclid(session.params.ticdup as i64);
        let requested = self.tics_due(now);
        let mut produced = 0;
        while produced < requested && produce_one_tic(session, engine) {
            produced += 1;
        }
        PumpOutcome {
            requested,
            produced,
        }
    }

    /// Outstanding tic debt.
    pub fn skip(&self) -> i64 {
        self.skip
    }

    /// Set the tic debt, e.g. to drop one tic when running ahead.
    pub fn set_skip(&mut self, skip: i64) {
        self.skip = skip;
    }

    /// Last pacing clock reading.
    pub fn last_time(&self) -> i64 {
        self.last_time
    }

    /// Pull the pacing clock back one tic, so the next pump sees one
    /// extra tic of elapsed time.
    pub fn rewind(&mut self) {
        self.last_time -= 1;
    }
}
