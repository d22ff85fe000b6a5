//! A SysV semaphore used as a single-value gate rather than a counter.
//!
//! The tide scheduler uses one `Barrier` per row: `wait` blocks a court
//! worker until the row is open, `signal` opens it. Every transition goes
//! through `set`, never through `semop` increment/decrement pairs — a
//! `set(0)`-then-`wait` can never race a `signal` the way a bare decrement
//! can, which is what makes this safe to drive from a single scheduler
//! thread without an extra lock around it.

use log::debug;

use crate::error::{BarrierError, IpcError};
use crate::key::Key;
use crate::owner::Owner;

#[repr(C)]
union semun {
    val: libc::c_int,
    buf: *mut libc::semid_ds,
    array: *mut libc::c_ushort,
}

/// Creates a semaphore set of one semaphore and initializes it to `initial`.
pub fn create(key: &Key, initial: i32) -> Result<(), IpcError> {
    let token = key.token()?;
    let semid = unsafe { libc::semget(token, 1, 0o644 | libc::IPC_CREAT | libc::IPC_EXCL) };
    if semid < 0 {
        return Err(BarrierError(format!("semget {key}: {}", std::io::Error::last_os_error())).into());
    }

    let arg = semun { val: initial };
    if unsafe { libc::semctl(semid, 0, libc::SETVAL, arg) } < 0 {
        return Err(BarrierError(format!("semctl SETVAL {key}: {}", std::io::Error::last_os_error())).into());
    }

    debug!("barrier create: key={key} semid={semid} initial={initial}");
    Ok(())
}

/// Destroys a semaphore set. Best-effort.
pub fn destroy(key: &Key) {
    let Ok(token) = key.token() else { return };
    let semid = unsafe { libc::semget(token, 1, 0o644) };
    if semid < 0 {
        return;
    }
    if unsafe { libc::semctl(semid, 0, libc::IPC_RMID, semun { val: 0 }) } < 0 {
        debug!("barrier destroy {key}: {}", std::io::Error::last_os_error());
    }
}

/// A single-semaphore gate, open (value 0) or closed (value > 0).
pub struct Barrier {
    key: Key,
    semid: i32,
    owner: Owner,
    initial: i32,
}

impl Barrier {
    pub fn create_and_open(key: &Key, initial: i32) -> Result<Self, IpcError> {
        create(key, initial)?;
        Self::attach(key, Owner::creator(), initial)
    }

    /// `initial` must be the value the barrier was originally created with;
    /// it is only needed to support [`reset`](Self::reset) from this handle.
    pub fn attach_existing(key: &Key, initial: i32) -> Result<Self, IpcError> {
        Self::attach(key, Owner::attached(), initial)
    }

    fn attach(key: &Key, owner: Owner, initial: i32) -> Result<Self, IpcError> {
        let token = key.token()?;
        let semid = unsafe { libc::semget(token, 1, 0o644) };
        if semid < 0 {
            return Err(BarrierError(format!("semget {key}: {}", std::io::Error::last_os_error())).into());
        }
        Ok(Self {
            key: key.clone(),
            semid,
            owner,
            initial,
        })
    }

    fn semop(&self, op: i16) -> Result<(), IpcError> {
        let mut sops = libc::sembuf {
            sem_num: 0,
            sem_op: op,
            sem_flg: 0,
        };
        if unsafe { libc::semop(self.semid, &mut sops, 1) } < 0 {
            return Err(BarrierError(format!(
                "semop({op}) {}: {}",
                self.key,
                std::io::Error::last_os_error()
            ))
            .into());
        }
        Ok(())
    }

    /// Blocks until the gate's value reaches zero, then returns without
    /// changing it — any number of waiters can pass through concurrently.
    pub fn wait(&self) -> Result<(), IpcError> {
        self.semop(0)
    }

    /// Sets the gate to an arbitrary non-negative value.
    pub fn set(&self, value: i32) -> Result<(), IpcError> {
        let arg = semun { val: value };
        if unsafe { libc::semctl(self.semid, 0, libc::SETVAL, arg) } < 0 {
            return Err(BarrierError(format!(
                "semctl SETVAL {}: {}",
                self.key,
                std::io::Error::last_os_error()
            ))
            .into());
        }
        Ok(())
    }

    /// Opens the gate: equivalent to `set(0)`.
    pub fn open(&self) -> Result<(), IpcError> {
        self.set(0)
    }

    /// Closes the gate to a single outstanding permit.
    pub fn close(&self) -> Result<(), IpcError> {
        self.set(1)
    }

    /// Restores the gate to the value it was created with.
    pub fn reset(&self) -> Result<(), IpcError> {
        self.set(self.initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_key(name: &str, disc: u8) -> Key {
        let path = std::env::temp_dir().join(format!("bv-ipc-barrier-test-{name}-{}", std::process::id()));
        if !path.exists() {
            std::fs::File::create(&path).unwrap();
        }
        Key::new(path, disc)
    }

    #[test]
    fn an_open_gate_does_not_block_wait() {
        let key = scratch_key("open", 20);
        let barrier = Barrier::create_and_open(&key, 0).unwrap();
        barrier.wait().unwrap();
    }

    #[test]
    fn closing_then_opening_unblocks_a_waiter() {
        let key = scratch_key("close-open", 21);
        let barrier = Barrier::create_and_open(&key, 1).unwrap();

        let attached = Barrier::attach_existing(&key, 1).unwrap();
        let waiter = std::thread::spawn(move || attached.wait());

        std::thread::sleep(std::time::Duration::from_millis(20));
        barrier.open().unwrap();
        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn a_second_handle_observes_the_same_gate() {
        let key = scratch_key("shared", 22);
        let barrier = Barrier::create_and_open(&key, 1).unwrap();
        let attached = Barrier::attach_existing(&key, 1).unwrap();
        attached.open().unwrap();
        barrier.wait().unwrap();
    }

    #[test]
    fn reset_restores_the_construction_value() {
        let key = scratch_key("reset", 23);
        let barrier = Barrier::create_and_open(&key, 1).unwrap();
        barrier.open().unwrap();
        barrier.wait().unwrap();

        barrier.reset().unwrap();
        let attached = Barrier::attach_existing(&key, 1).unwrap();
        let waiter = std::thread::spawn(move || attached.wait());

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!waiter.is_finished());
        barrier.open().unwrap();
        waiter.join().unwrap().unwrap();
    }
}

impl Drop for Barrier {
    fn drop(&mut self) {
        if self.owner.owns() {
            destroy(&self.key);
        }
    }
}
