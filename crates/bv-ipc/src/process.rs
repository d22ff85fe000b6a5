//! Fork-based process spawning.
//!
//! `Process::spawn` forks, runs `callable` in the child, and turns a
//! successful return from `callable` into `Err(IpcError::ChildExit)` —
//! mirroring how the child branch should unwind all the way back up to its
//! own `main` without falling through into code meant for the parent.
//! Every binary's `main` matches on `IpcError::ChildExit` and treats it as a
//! clean shutdown (exit code 0) rather than a failure.

use log::debug;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use crate::error::IpcError;
use crate::owner::Owner;

/// A forked child process, from the parent's side.
///
/// Carries an [`Owner`] the same way every other kernel object in this crate
/// does: a `Process` handle spawned in iteration `i` of a loop is duplicated
/// by `fork` into every process spawned at iteration `i+1` and later, so its
/// `Drop` impl must only `waitpid` when running in the actual parent —
/// otherwise a sibling's forked child would try to reap processes it never
/// spawned.
pub struct Process {
    child: Pid,
    reaped: bool,
    owner: Owner,
}

impl Process {
    /// Forks. In the child, runs `callable` and — if it returns `Ok(())` —
    /// returns `Err(IpcError::ChildExit)`, which the caller's `?` propagates
    /// straight past the parent-only code that follows `spawn`. In the
    /// parent, returns a handle used to `wait` for the child later.
    pub fn spawn<F>(callable: F) -> Result<Self, IpcError>
    where
        F: FnOnce() -> Result<(), IpcError>,
    {
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                callable()?;
                Err(IpcError::ChildExit)
            }
            Ok(ForkResult::Parent { child }) => Ok(Self {
                child,
                reaped: false,
                owner: Owner::creator(),
            }),
            Err(e) => Err(IpcError::Io(std::io::Error::from_raw_os_error(e as i32))),
        }
    }

    pub fn pid(&self) -> Pid {
        self.child
    }

    /// Blocks until the child exits, returning its exit code (signal
    /// termination is reported as `128 + signal number`, the shell
    /// convention).
    pub fn wait(&mut self) -> Result<i32, IpcError> {
        self.reaped = true;
        match waitpid(self.child, None) {
            Ok(WaitStatus::Exited(_, code)) => Ok(code),
            Ok(WaitStatus::Signaled(_, sig, _)) => Ok(128 + sig as i32),
            Ok(other) => {
                debug!("waitpid({}) returned unexpected status: {other:?}", self.child);
                Ok(-1)
            }
            Err(e) => Err(IpcError::Io(std::io::Error::from_raw_os_error(e as i32))),
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if !self.reaped && self.owner.owns() {
            let _ = waitpid(self.child, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_successful_child_exits_cleanly() {
        match Process::spawn(|| Ok(())) {
            Ok(mut process) => {
                let code = process.wait().unwrap();
                assert_eq!(code, 0);
            }
            Err(IpcError::ChildExit) => std::process::exit(0),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn a_failing_callable_propagates_its_error_to_the_child() {
        match Process::spawn(|| Err(IpcError::RepeatedPair { a: 1, b: 2 })) {
            Ok(mut process) => {
                let code = process.wait().unwrap();
                assert_ne!(code, 0);
            }
            Err(_) => std::process::exit(1),
        }
    }

    #[test]
    fn a_handle_inherited_by_a_later_sibling_does_not_own_it() {
        // Mimics a loop that spawns several children one after another: the
        // handle for the first child is still on the stack when the second
        // `fork` runs, so the second child's own copy of that handle must
        // not try to reap a process it never spawned.
        match Process::spawn(|| Ok(())) {
            Ok(mut first) => {
                assert!(first.owner.owns());
                let clone_in_this_process = Process {
                    child: first.pid(),
                    reaped: false,
                    owner: Owner::attached(),
                };
                assert!(!clone_in_this_process.owner.owns());
                drop(clone_in_this_process);
                assert_eq!(first.wait().unwrap(), 0);
            }
            Err(IpcError::ChildExit) => std::process::exit(0),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
