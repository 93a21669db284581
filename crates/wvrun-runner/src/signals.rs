//! Signal delivery plumbing.
//!
//! Interrupt and terminate handlers do nothing but set a flag; the
//! supervisor's read loop polls the flags and forwards the signal to the
//! child's process group from its own thread, so no handler ever touches
//! session state or buffered I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use signal_hook::consts::{SIGINT, SIGTERM};

/// Flag pair set asynchronously by the process-level signal handlers.
#[derive(Debug, Clone)]
pub struct InterruptFlags {
    interrupt: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
}

impl InterruptFlags {
    /// Install handlers for SIGINT and SIGTERM that only set the flags.
    pub fn register() -> std::io::Result<Self> {
        let interrupt = Arc::new(AtomicBool::new(false));
        let terminate = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGINT, Arc::clone(&interrupt))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&terminate))?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    /// Flags for tests: nothing is registered, the flags are set manually.
    #[must_use]
    pub fn unregistered() -> Self {
        Self {
            interrupt: Arc::new(AtomicBool::new(false)),
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn raise_interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    pub fn raise_terminate(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }

    /// Consume one pending signal, terminate first. Clearing the flag means
    /// a repeated signal is forwarded again.
    #[must_use]
    pub fn take(&self) -> Option<i32> {
        if self.terminate.swap(false, Ordering::Relaxed) {
            return Some(SIGTERM);
        }
        if self.interrupt.swap(false, Ordering::Relaxed) {
            return Some(SIGINT);
        }
        None
    }
}

/// Send `signal` to every process in the group `pgid`.
pub fn signal_process_group(pgid: i32, signal: i32) -> Result<(), String> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let signal = Signal::try_from(signal).map_err(|err| err.to_string())?;
        killpg(Pid::from_raw(pgid), signal).map_err(|err| err.to_string())
    }

    #[cfg(not(unix))]
    {
        let _ = (pgid, signal);
        Err("process group signals are only supported on unix".to_string())
    }
}
