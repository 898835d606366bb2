//! Permit-based reader-writer lock.

use std::ptr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use thread_local::ThreadLocal;

use crate::observability::metrics;
use crate::sync::permit::{Permit, PermitState, ReadHold, SuspendedRead, WriterHold};

/// Default bound on a writer's permit acquisition.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(50);

/// Errors raised by the lock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Writer could not collect every permit before its deadline.
    #[error("write lock not acquired within {timeout:?} (waited {waited:?})")]
    WriteTimeout { timeout: Duration, waited: Duration },
}

/// Snapshot of permit ownership across the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub registered: usize,
    pub held_by_readers: usize,
    pub held_by_writer: usize,
}

/// Reader-writer lock where each reader thread owns a private permit.
///
/// Readers only ever touch their own permit, so they never contend with each
/// other. A writer serializes against other writers through `admission`, then
/// collects every registered permit before running its body. Writes cost
/// O(threads that have ever read) and can be starved by a long read-scope.
#[derive(Debug)]
pub struct PermitLock {
    admission: Mutex<()>,
    permits: ThreadLocal<Permit>,
    write_timeout: Duration,
}

impl PermitLock {
    /// Create a lock with the default 50 ms write timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_WRITE_TIMEOUT)
    }

    pub fn with_timeout(write_timeout: Duration) -> Self {
        Self {
            admission: Mutex::new(()),
            permits: ThreadLocal::new(),
            write_timeout,
        }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Run `body` inside a read-scope.
    ///
    /// A `read` nested in another `read` on the same thread reuses the held
    /// permit. Calling `read` from inside a `write` body deadlocks.
    pub fn read<R>(&self, body: impl FnOnce() -> R) -> R {
        let permit = self.own_permit();
        // Only the owning thread ever moves its permit to HeldByReader.
        if permit.state() == PermitState::HeldByReader {
            return body();
        }
        let _hold = ReadHold::acquire(permit);
        body()
    }

    /// Run `body` with exclusivity against every reader, using the configured timeout.
    pub fn write<R>(&self, body: impl FnOnce() -> R) -> Result<R, LockError> {
        self.write_with_timeout(self.write_timeout, body)
    }

    /// Run `body` with exclusivity against every reader.
    ///
    /// May be called from inside the caller's own read-scope: the caller's
    /// permit is released for the duration and taken back afterwards.
    pub fn write_with_timeout<R>(
        &self,
        timeout: Duration,
        body: impl FnOnce() -> R,
    ) -> Result<R, LockError> {
        let _admission = self.admission.lock();

        let own = self.permits.get();
        let _suspended = own.and_then(SuspendedRead::suspend);

        let started = Instant::now();
        let mut held = Vec::new();
        for permit in self.permits.iter() {
            if own.is_some_and(|own| ptr::eq(own, permit)) {
                continue;
            }
            loop {
                if let Some(hold) = WriterHold::try_acquire(permit) {
                    held.push(hold);
                    break;
                }
                let waited = started.elapsed();
                if waited > timeout {
                    tracing::warn!(
                        timeout = ?timeout,
                        waited = ?waited,
                        acquired = held.len(),
                        "Write lock timed out waiting for readers"
                    );
                    metrics::record_write_timeout();
                    return Err(LockError::WriteTimeout { timeout, waited });
                }
                std::thread::yield_now();
            }
        }

        Ok(body())
    }

    /// True when the calling thread is inside a read-scope on this lock.
    pub fn holds_read(&self) -> bool {
        self.permits
            .get()
            .is_some_and(|permit| permit.state() == PermitState::HeldByReader)
    }

    pub fn stats(&self) -> LockStats {
        self.permits
            .iter()
            .fold(LockStats::default(), |mut stats, permit| {
                stats.registered += 1;
                match permit.state() {
                    PermitState::HeldByReader => stats.held_by_readers += 1,
                    PermitState::HeldByWriter => stats.held_by_writer += 1,
                    PermitState::Unheld => {}
                }
                stats
            })
    }

    /// The calling thread's permit, registered on first use.
    ///
    /// Registration happens under `admission` so a writer already past its
    /// enumeration can never miss a newly arrived reader.
    fn own_permit(&self) -> &Permit {
        if let Some(permit) = self.permits.get() {
            return permit;
        }
        let _admission = self.admission.lock();
        self.permits.get_or(Permit::new)
    }
}

impl Default for PermitLock {
    fn default() -> Self {
        Self::new()
    }
}
