//! Minute-resolution reminder scheduling.
//!
//! A background task wakes at every minute boundary and runs one sweep:
//! expire reminders whose window has passed, find the ones due at the
//! current local minute, record a pending history row for each, and
//! dispatch notifications. The sweep itself is a plain async function
//! over a database connection so tests (and the manual trigger
//! endpoint) can run it at any instant they choose.

pub mod background;
pub mod clock;
pub mod sweep;

pub use background::{start_sweep_loop, SweepLoopHandle};
pub use clock::{Clock, SweepInstant, SystemClock};
pub use sweep::{compute_due_reminders, run_sweep, SweepContext, SweepError, SweepOutcome};
