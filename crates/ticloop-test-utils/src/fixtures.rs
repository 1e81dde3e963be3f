//! Seeded engine fixtures.
//!
//! [`ChaChaInputEngine`] generates pseudo-random local input from a
//! ChaCha8 stream and runs a toy simulation over every participant's
//! commands. Two engines built with the same seed produce the same
//! commands, and any engine fed the same command sequence reaches the
//! same state, which is what determinism and replay tests need.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ticloop_core::{Buttons, SimulationEngine, StateDigest, TicCmd, TicIndex, MAX_PARTICIPANTS};

/// Position and heading of one participant in the toy simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Actor {
    pub x: i64,
    pub y: i64,
    pub angle: u16,
    pub shots: u32,
}

/// Seeded input source plus toy simulation.
#[derive(Clone, Debug)]
pub struct ChaChaInputEngine {
    rng: ChaCha8Rng,
    actors: [Actor; MAX_PARTICIPANTS],
    tics: u64,
    chat_every: Option<u64>,
}

impl ChaChaInputEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            actors: [Actor::default(); MAX_PARTICIPANTS],
            tics: 0,
            chat_every: None,
        }
    }

    /// Type a chat character on every `n`th produced tic.
    pub fn with_chat_every(mut self, n: u64) -> Self {
        self.chat_every = Some(n.max(1));
        self
    }

    pub fn actors(&self) -> &[Actor; MAX_PARTICIPANTS] {
        &self.actors
    }

    /// Simulation steps run so far.
    pub fn tics(&self) -> u64 {
        self.tics
    }
}

impl SimulationEngine for ChaChaInputEngine {
    fn sample_input(&mut self) {}

    fn advance_menu(&mut self) {}

    fn fill_command(&mut self, cmd: &mut TicCmd, tic: TicIndex) {
        let bits = self.rng.next_u64();
        cmd.forward_move = (bits & 0xff) as i8 / 2;
        cmd.side_move = ((bits >> 8) & 0xff) as i8 / 4;
        cmd.angle_turn = ((bits >> 16) & 0xffff) as i16;
        cmd.buttons = ((bits >> 32) as u8) & (Buttons::ATTACK | Buttons::USE);
        cmd.consistency = tic.0 as u16;
        if let Some(n) = self.chat_every {
            if tic.0 % n == 0 {
                cmd.chat_char = b'a' + (tic.0 % 26) as u8;
            }
        }
    }

    fn step_simulation(
        &mut self,
        commands: &[TicCmd; MAX_PARTICIPANTS],
        present: &[bool; MAX_PARTICIPANTS],
    ) {
        for (actor, (cmd, &here)) in self
            .actors
            .iter_mut()
            .zip(commands.iter().zip(present.iter()))
        {
            if !here {
                continue;
            }
            actor.angle = actor.angle.wrapping_add(cmd.angle_turn as u16);
            let heading = i64::from(actor.angle >> 14);
            actor.x += i64::from(cmd.forward_move) * (heading - 1);
            actor.y += i64::from(cmd.side_move) * (2 - heading);
            if cmd.buttons & Buttons::ATTACK != 0 && !cmd.is_special() {
                actor.shots += 1;
            }
            if cmd.chat_char != 0 {
                actor.shots = actor.shots.wrapping_mul(31).wrapping_add(u32::from(cmd.chat_char));
            }
        }
        self.tics += 1;
    }
}

impl StateDigest for ChaChaInputEngine {
    fn digest(&self) -> u64 {
        // FNV-1a over the actor fields and tic count.
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= u64::from(b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for a in &self.actors {
            mix(&a.x.to_le_bytes());
            mix(&a.y.to_le_bytes());
            mix(&a.angle.to_le_bytes());
            mix(&a.shots.to_le_bytes());
        }
        mix(&self.tics.to_le_bytes());
        h
    }
}
