//! Collaborator traits driven by the scheduler.

use crate::command::TicCmd;
use crate::id::{TicIndex, MAX_PARTICIPANTS};

/// The simulation the scheduler drives, one tic at a time.
///
/// Input sampling and menu processing happen once per attempted local
/// production, whether or not pacing lets the tic through. Everything
/// that affects simulation state must flow through
/// [`step_simulation`](SimulationEngine::step_simulation) so that
/// identical command sequences produce identical states on every machine.
pub trait SimulationEngine {
    /// Capture pending local input (keyboard, mouse, pad).
    fn sample_input(&mut self);

    /// Advance menu and UI state. Called even while the game is paused.
    fn advance_menu(&mut self);

    /// Populate a zeroed command for `tic` from the sampled input.
    ///
    /// Must be deterministic given the same sampled input.
    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex);

    /// Advance the simulation by exactly one tic.
    ///
    /// The slices are only valid for the duration of the call.
    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    );
}

/// A monotonic millisecond clock.
///
/// `&mut self` lets test clocks advance on every read.
pub trait TimeSource {
    /// Milliseconds since an arbitrary fixed origin. Never decreases.
    fn now_ms(&mut self) -> u64;
}

/// A compact fingerprint of simulation state.
///
/// Used by demo verification to detect the first tic at which two runs
/// diverge.
pub trait StateDigest {
    /// Hash of the current state. Equal states must hash equal.
    fn digest(&self) -> u64;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for &mut E {
    fn sample_input(&mut self) {
        (**self).sample_input();
    }

    fn advance_menu(&mut self) {
        (**self).advance_menu();
    }

    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex) {
        (**self).fill_command(cmd, tic);
    }

    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    ) {
        (**self).step_simulation(commands, present);
    }
}

impl<C: TimeSource + ?Sized> TimeSource for &mut C {
    fn now_ms(&mut self) -> u64 {
        (**self).now_ms()
    }
}
