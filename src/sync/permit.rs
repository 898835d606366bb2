//! Per-thread permits.
//!
//! # States
//! - Unheld: nobody owns the permit
//! - HeldByReader: the owning thread is inside a read-scope
//! - HeldByWriter: a writer took it during its acquisition loop
//!
//! # State Transitions
//! ```text
//! Unheld → HeldByReader: owning thread enters read()
//! HeldByReader → Unheld: read() exits, or a nested write() suspends it
//! Unheld → HeldByWriter: writer's try_acquire_write() succeeds
//! HeldByWriter → Unheld: writer releases after its body
//! ```

use parking_lot::{Condvar, Mutex};

/// Ownership state of a single permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitState {
    Unheld,
    HeldByReader,
    HeldByWriter,
}

/// Exclusive token owned by one reader thread.
#[derive(Debug)]
pub struct Permit {
    state: Mutex<PermitState>,
    released: Condvar,
}

impl Permit {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PermitState::Unheld),
            released: Condvar::new(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> PermitState {
        *self.state.lock()
    }

    /// Block until the permit is free, then take it as a reader.
    pub fn acquire_read(&self) {
        let mut state = self.state.lock();
        while *state != PermitState::Unheld {
            self.released.wait(&mut state);
        }
        *state = PermitState::HeldByReader;
    }

    /// Take the permit for a writer without blocking.
    pub fn try_acquire_write(&self) -> bool {
        let Some(mut state) = self.state.try_lock() else {
            return false;
        };
        if *state == PermitState::Unheld {
            *state = PermitState::HeldByWriter;
            true
        } else {
            false
        }
    }

    /// Give up a reader hold so a nested writer on the same thread can proceed.
    ///
    /// Returns false when the permit was not held by a reader.
    pub fn suspend_read(&self) -> bool {
        let mut state = self.state.lock();
        if *state == PermitState::HeldByReader {
            *state = PermitState::Unheld;
            true
        } else {
            false
        }
    }

    /// Return the permit to `Unheld` and wake a blocked reader.
    pub fn release(&self) {
        *self.state.lock() = PermitState::Unheld;
        self.released.notify_all();
    }
}

impl Default for Permit {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader hold released on every exit path.
pub(crate) struct ReadHold<'a> {
    permit: &'a Permit,
}

impl<'a> ReadHold<'a> {
    pub(crate) fn acquire(permit: &'a Permit) -> Self {
        permit.acquire_read();
        Self { permit }
    }
}

impl Drop for ReadHold<'_> {
    fn drop(&mut self) {
        self.permit.release();
    }
}

/// Permit taken by a writer's acquisition loop.
pub(crate) struct WriterHold<'a> {
    permit: &'a Permit,
}

impl<'a> WriterHold<'a> {
    pub(crate) fn try_acquire(permit: &'a Permit) -> Option<Self> {
        permit.try_acquire_write().then(|| Self { permit })
    }
}

impl Drop for WriterHold<'_> {
    fn drop(&mut self) {
        self.permit.release();
    }
}

/// The caller's own reader hold, suspended for the length of a nested write.
///
/// Dropping it takes the permit back as a reader.
pub(crate) struct SuspendedRead<'a> {
    permit: &'a Permit,
}

impl<'a> SuspendedRead<'a> {
    pub(crate) fn suspend(permit: &'a Permit) -> Option<Self> {
        permit.suspend_read().then(|| Self { permit })
    }
}

impl Drop for SuspendedRead<'_> {
    fn drop(&mut self) {
        self.permit.acquire_read();
    }
}
