//! wvrun-runner: subprocess supervision for WvTest streams.
//!
//! The supervisor launches a command in its own process group, merges its
//! stdout and stderr into one line stream, feeds every line through the
//! session, and guards the whole thing with an inactivity watchdog.
//! Interrupt and terminate signals sent to the supervising process are
//! forwarded to the child's process group so the child and its descendants
//! stop together.

pub mod signals;
pub mod supervisor;
pub mod watchdog;

pub use signals::InterruptFlags;
pub use supervisor::{Supervisor, SuperviseError, DEFAULT_TIMEOUT_SECONDS};
pub use watchdog::Watchdog;
