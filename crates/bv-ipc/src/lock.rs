//! Byte-range advisory locks over an open file descriptor, via `fcntl(2)`.
//!
//! A `Lock` claims `[offset, offset + length)` in `Mode::Read` (shared) or
//! `Mode::Write` (exclusive) and releases it when dropped. This is how the
//! players table serializes access to one player's record without taking a
//! lock over the whole segment.

use std::os::fd::RawFd;

use log::debug;

use crate::error::{IpcError, LockError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    fn l_type(self) -> libc::c_short {
        match self {
            Mode::Read => libc::F_RDLCK as libc::c_short,
            Mode::Write => libc::F_WRLCK as libc::c_short,
        }
    }
}

fn flock(mode: Mode, offset: i64, length: i64) -> libc::flock {
    let mut fl: libc::flock = unsafe { std::mem::zeroed() };
    fl.l_type = mode.l_type();
    fl.l_whence = libc::SEEK_SET as libc::c_short;
    fl.l_start = offset;
    fl.l_len = length;
    fl
}

/// A byte range held locked on `fd` for the lifetime of this value.
pub struct Lock {
    fd: RawFd,
    offset: i64,
    length: i64,
}

impl Lock {
    /// Blocks until the range is acquired.
    pub fn acquire(fd: RawFd, mode: Mode, offset: i64, length: i64) -> Result<Self, IpcError> {
        let fl = flock(mode, offset, length);
        if unsafe { libc::fcntl(fd, libc::F_SETLKW, &fl) } < 0 {
            return Err(LockError(format!(
                "acquire [{offset}, {}) failed: {}",
                offset + length,
                std::io::Error::last_os_error()
            ))
            .into());
        }
        Ok(Self { fd, offset, length })
    }

    /// Attempts to acquire the range without blocking; `Ok(None)` means it
    /// is already held elsewhere.
    pub fn try_acquire(fd: RawFd, mode: Mode, offset: i64, length: i64) -> Result<Option<Self>, IpcError> {
        let fl = flock(mode, offset, length);
        if unsafe { libc::fcntl(fd, libc::F_SETLK, &fl) } < 0 {
            let err = std::io::Error::last_os_error();
            if matches!(err.raw_os_error(), Some(libc::EACCES) | Some(libc::EAGAIN)) {
                return Ok(None);
            }
            return Err(LockError(format!(
                "try_acquire [{offset}, {}) failed: {err}",
                offset + length
            ))
            .into());
        }
        Ok(Some(Self { fd, offset, length }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::fd::AsRawFd;

    fn scratch_file() -> std::fs::File {
        let path = std::env::temp_dir().join(format!("bv-ipc-lock-test-{}", std::process::id()));
        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        f.write_all(&[0u8; 64]).unwrap();
        f
    }

    #[test]
    fn acquire_then_release_allows_reacquiring() {
        let f = scratch_file();
        {
            let _lock = Lock::acquire(f.as_raw_fd(), Mode::Write, 0, 16).unwrap();
        }
        let _lock = Lock::acquire(f.as_raw_fd(), Mode::Write, 0, 16).unwrap();
    }

    #[test]
    fn non_overlapping_ranges_can_both_be_held() {
        let f = scratch_file();
        let _a = Lock::acquire(f.as_raw_fd(), Mode::Write, 0, 8).unwrap();
        let _b = Lock::acquire(f.as_raw_fd(), Mode::Write, 8, 8).unwrap();
    }

    #[test]
    fn try_acquire_succeeds_when_the_range_is_free() {
        let f = scratch_file();
        let lock = Lock::try_acquire(f.as_raw_fd(), Mode::Read, 0, 16).unwrap();
        assert!(lock.is_some());
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let mut fl = flock(Mode::Read, self.offset, self.length);
        fl.l_type = libc::F_UNLCK as libc::c_short;
        if unsafe { libc::fcntl(self.fd, libc::F_SETLK, &fl) } < 0 {
            debug!(
                "lock release [{}, {}) on fd {}: {}",
                self.offset,
                self.offset + self.length,
                self.fd,
                std::io::Error::last_os_error()
            );
        }
    }
}
