//! Cooperative cancellation for scans.
//!
//! A [`KillSwitch`] wraps an `AtomicBool` that is shared between the
//! foreground thread, the background scan thread and the Ctrl+C handler.
//! The grouper checks it once per file, so cancellation takes effect after
//! the file currently being fingerprinted.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vidupe::signal::install_handler;
//!
//! let kill = install_handler().expect("Failed to install signal handler");
//!
//! // Hand a clone to the scan thread
//! let worker_kill = kill.clone();
//! std::thread::spawn(move || {
//!     if worker_kill.is_triggered() {
//!         return;
//!     }
//! });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag for one scan.
///
/// Cloning is cheap and every clone observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    flag: Arc<AtomicBool>,
}

impl KillSwitch {
    /// Create a switch that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the switch can guard the next scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_SWITCH: OnceLock<KillSwitch> = OnceLock::new();

/// Install a Ctrl+C handler that triggers the returned kill switch.
///
/// The handler is process-wide. Later calls return the already installed
/// switch after resetting it, so the same process can run several scans
/// (or several tests) in a row.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] only when another component has
/// already claimed the Ctrl+C handler and no switch of ours exists.
pub fn install_handler() -> Result<KillSwitch, SignalError> {
    if let Some(switch) = GLOBAL_SWITCH.get() {
        switch.reset();
        return Ok(switch.clone());
    }

    let switch = KillSwitch::new();
    let handler_switch = switch.clone();

    match ctrlc::set_handler(move || {
        handler_switch.trigger();
        log::info!("Kill switch activated: stopping scan...");
    }) {
        Ok(()) => {
            let _ = GLOBAL_SWITCH.set(switch.clone());
            Ok(switch)
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            // Someone else owns SIGINT (typically a parallel test); fall back
            // to a switch that can still be triggered manually.
            log::debug!("Ctrl+C handler already registered, using unhooked kill switch");
            Ok(GLOBAL_SWITCH.get_or_init(KillSwitch::new).clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
