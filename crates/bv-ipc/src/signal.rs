//! Process-wide shutdown flag, set from a signal handler.
//!
//! `SIGINT`, `SIGTERM`, `SIGPIPE`, and `SIGCHLD` all map to the same `quit`
//! flag: every loop in the system (court workers, the tide scheduler, the
//! aggregator, the scoreboard) winds down at the next checkpoint rather than
//! mid-record. Installing a custom handler for `SIGPIPE` also keeps its
//! default disposition (process termination) from killing a writer whose
//! reader has gone away; the write call itself still fails, and `quit` lets
//! the loop notice without a crash.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static QUIT: AtomicBool = AtomicBool::new(false);

extern "C" fn on_shutdown_signal(_: libc::c_int) {
    QUIT.store(true, Ordering::SeqCst);
}

/// True once a shutdown signal has been received. Cheap enough to poll in
/// every tight loop in the system.
pub fn quit_requested() -> bool {
    QUIT.load(Ordering::SeqCst)
}

/// Resets the flag. Only meaningful in tests, where the flag is otherwise
/// process-global and would leak between test cases.
pub fn reset() {
    QUIT.store(false, Ordering::SeqCst);
}

/// Installs the shutdown handlers for the calling process. Every binary
/// calls this once, before spawning any children or touching any IPC
/// object, so a signal arriving mid-setup is never silently dropped.
pub fn install_handlers() -> Result<(), crate::error::IpcError> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(on_shutdown_signal))
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(on_shutdown_signal))
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
        signal::signal(Signal::SIGPIPE, SigHandler::Handler(on_shutdown_signal))
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
        signal::signal(Signal::SIGCHLD, SigHandler::Handler(on_shutdown_signal))
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialized: QUIT is process-global and `install_handlers` mutates
    // global signal disposition, so these tests cannot run concurrently.
    static GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn a_shutdown_signal_flips_the_flag() {
        let _guard = GUARD.lock().unwrap();
        reset();
        install_handlers().unwrap();
        assert!(!quit_requested());
        unsafe { libc::raise(libc::SIGTERM) };
        assert!(quit_requested());
        reset();
    }
}
