//! Fixed-capacity ring of per-tic command sets.
//!
//! [`TicRing`] holds a sliding window of the most recent tics. Callers
//! address slots by [`TicIndex`] (a cursor value), never by raw slot
//! index; the modulo arithmetic stays inside this module.

use ticloop_core::{ParticipantId, RemoteBatch, TicCmd, TicIndex, TicSet, MAX_PARTICIPANTS};

/// A fixed-capacity ring of [`TicSet`] slots indexed by tic.
///
/// Each slot carries a tag: the highest tic written into it. A read for
/// a tic whose slot has since been reused by a newer tic is detected by
/// the tag mismatch and returns `None`.
#[derive(Clone, Debug)]
pub struct TicRing {
    slots: Vec<TicSet>,
    tags: Vec<Option<u64>>,
    capacity: usize,
}

impl TicRing {
    /// Create a ring with the given number of slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`. Scheduler construction validates the
    /// capacity before it gets here.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "TicRing capacity must be >= 2, got {capacity}");
        Self {
            slots: vec![TicSet::default(); capacity],
            tags: vec![None; capacity],
            capacity,
        }
    }

    fn index(&self, tic: TicIndex) -> usize {
        (tic.0 % self.capacity as u64) as usize
    }

    fn claim(&mut self, tic: TicIndex) -> &mut TicSet {
        let idx = self.index(tic);
        let tag = &mut self.tags[idx];
        if tag.is_none_or(|t| t < tic.0) {
            *tag = Some(tic.0);
        }
        &mut self.slots[idx]
    }

    /// The slot for `tic`, whatever tic last wrote it.
    pub fn slot(&self, tic: TicIndex) -> &TicSet {
        &self.slots[self.index(tic)]
    }

    /// Mutable access to the slot for `tic`, claiming it for that tic.
    pub fn slot_mut(&mut self, tic: TicIndex) -> &mut TicSet {
        self.claim(tic)
    }

    /// The slot for `tic` if it has been written for that tic and not
    /// overwritten since.
    pub fn get(&self, tic: TicIndex) -> Option<&TicSet> {
        let idx = self.index(tic);
        match self.tags[idx] {
            Some(t) if t == tic.0 => Some(&self.slots[idx]),
            _ => None,
        }
    }

    /// Store one participant's command for `tic` and mark it present.
    pub fn store_local(&mut self, tic: TicIndex, participant: ParticipantId, cmd: TicCmd) {
        let set = self.claim(tic);
        set.commands[participant.index()] = cmd;
        set.present[participant.index()] = true;
    }

    /// Copy every column of `batch` into the slot for `tic`, except the
    /// `keep` participant's column, which is left untouched.
    pub fn store_remote(&mut self, tic: TicIndex, keep: Option<ParticipantId>, batch: &RemoteBatch) {
        let set = self.claim(tic);
        for i in 0..MAX_PARTICIPANTS {
            if keep.is_some_and(|p| p.index() == i) {
                continue;
            }
            set.commands[i] = batch.commands[i];
            set.present[i] = batch.present[i];
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
