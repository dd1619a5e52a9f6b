//! Per-tick meeting point of the two connection handlers.
//!
//! Each handler reports a finished tick with [`TickRendezvous::arrive`].
//! The world advances once per generation: the arrival that makes every
//! live slot complete the current generation is told to run the advance,
//! every other arrival just proceeds. Nobody ever waits, so a handler whose
//! peer stalls or disconnects keeps serving its own client.

use shared::Slot;

#[derive(Debug, Default, Clone)]
pub struct TickRendezvous {
    completed: [Option<u64>; 2],
    generation: u64,
}

impl TickRendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of world advances handed out so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self, slot: Slot) -> bool {
        self.completed[slot.index()].is_some()
    }

    /// Starts counting ticks for `slot` from the current generation.
    pub fn join(&mut self, slot: Slot) {
        self.completed[slot.index()] = Some(self.generation);
    }

    /// Stops waiting on `slot`.
    pub fn leave(&mut self, slot: Slot) {
        self.completed[slot.index()] = None;
    }

    /// Records one finished tick for `slot`. Returns true when the caller
    /// must advance the world.
    ///
    /// A slot that has not joined is joined first.
    pub fn arrive(&mut self, slot: Slot) -> bool {
        let completed = self.completed[slot.index()].get_or_insert(self.generation);
        *completed += 1;

        let slowest = self.completed.iter().flatten().copied().min();
        match slowest {
            Some(slowest) if slowest > self.generation => {
                self.generation = slowest;
                true
            }
            _ => false,
        }
    }
}
