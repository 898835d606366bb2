//! Reader-writer synchronization.
//!
//! # Data Flow
//! ```text
//! read(body):
//!     → own permit (registered on first use)
//!     → Unheld → HeldByReader
//!     → body
//!     → HeldByReader → Unheld (on every exit path)
//!
//! write(body):
//!     → admission mutex (writers queue here)
//!     → suspend caller's own reader hold, if any
//!     → try-lock every other permit until deadline
//!     → body
//!     → release permits, restore own hold, release admission
//! ```
//!
//! # Design Decisions
//! - Read path touches only thread-private state; no shared counters
//! - Registry is never pruned; a finished thread's permit is left `Unheld`
//!   and its slot is handed to the next thread that reads
//! - Timeouts apply to writers only

pub mod lock;
pub mod permit;

pub use lock::{LockError, LockStats, PermitLock, DEFAULT_WRITE_TIMEOUT};
pub use permit::{Permit, PermitState};
