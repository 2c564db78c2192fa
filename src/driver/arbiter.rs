//! Modem arbiter
//!
//! Three-state mutual exclusion over the radio: `Free -> Busy -> Cleanup ->
//! Free`. The `Busy -> Cleanup` compare-and-set is the single point where a
//! caller's timeout path and the completion handler decide who finalizes an
//! operation.
//!
//! The state word also carries a generation counter, bumped on every
//! acquisition. Paths that may run late (caller timeout, continuous receive
//! stop, re-arm) release only the operation they started with.

use core::sync::atomic::{AtomicU32, Ordering};

const STATE_MASK: u32 = 0b11;
const GENERATION_SHIFT: u32 = 2;

const FREE: u32 = 0;
const BUSY: u32 = 1;
const CLEANUP: u32 = 2;

/// Arbiter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemState {
    /// No operation in flight
    Free,
    /// An operation owns the radio
    Busy,
    /// The operation is being finalized
    Cleanup,
}

/// Identifies one acquisition of the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperationId(u32);

impl OperationId {
    /// Raw generation number
    #[inline]
    pub const fn generation(self) -> u32 {
        self.0
    }
}

#[inline]
const fn state_of(word: u32) -> u32 {
    word & STATE_MASK
}

#[inline]
const fn generation_of(word: u32) -> u32 {
    word >> GENERATION_SHIFT
}

#[inline]
const fn pack(generation: u32, state: u32) -> u32 {
    (generation << GENERATION_SHIFT) | state
}

/// Lock-free tri-state arbiter
pub struct Arbiter {
    word: AtomicU32,
}

impl Arbiter {
    /// Create a free arbiter (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(pack(0, FREE)),
        }
    }

    /// Current state
    pub fn state(&self) -> ModemState {
        match state_of(self.word.load(Ordering::Acquire)) {
            BUSY => ModemState::Busy,
            CLEANUP => ModemState::Cleanup,
            _ => ModemState::Free,
        }
    }

    /// Operation currently holding the arbiter (`Busy` or `Cleanup`)
    pub fn current_operation(&self) -> Option<OperationId> {
        let word = self.word.load(Ordering::Acquire);
        (state_of(word) != FREE).then_some(OperationId(generation_of(word)))
    }

    /// Returns `true` if `id` is the operation currently `Busy`
    pub fn is_active(&self, id: OperationId) -> bool {
        self.word.load(Ordering::Acquire) == pack(id.0, BUSY)
    }

    /// `Free -> Busy`; returns `false` without side effects if not free
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_operation().is_some()
    }

    /// `Free -> Busy`, returning the identifier of the new operation
    pub fn try_acquire_operation(&self) -> Option<OperationId> {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            if state_of(current) != FREE {
                return None;
            }
            let generation = generation_of(current).wrapping_add(1) & (u32::MAX >> GENERATION_SHIFT);
            match self.word.compare_exchange_weak(
                current,
                pack(generation, BUSY),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(OperationId(generation)),
                Err(observed) => current = observed,
            }
        }
    }

    /// `Busy -> Cleanup` for whichever operation is busy
    ///
    /// Exactly one concurrent caller receives `true`.
    pub fn try_begin_release(&self) -> bool {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            if state_of(current) != BUSY {
                return false;
            }
            match self.word.compare_exchange_weak(
                current,
                pack(generation_of(current), CLEANUP),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// `Busy -> Cleanup` only if `id` is still the busy operation
    pub fn try_begin_release_of(&self, id: OperationId) -> bool {
        self.word
            .compare_exchange(
                pack(id.0, BUSY),
                pack(id.0, CLEANUP),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `Cleanup -> Free`
    ///
    /// Only the winner of a `try_begin_release*` call may invoke this.
    /// Returns `false` (and changes nothing) if the arbiter was not in
    /// `Cleanup`.
    pub fn finish_release(&self) -> bool {
        let current = self.word.load(Ordering::Acquire);
        if state_of(current) != CLEANUP {
            return false;
        }
        self.word
            .compare_exchange(
                current,
                pack(generation_of(current), FREE),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}
