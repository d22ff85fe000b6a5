//! Named FIFO queues carrying fixed-size POD records between processes.
//!
//! Every queue is a `mkfifo(3)` path plus a blocking `open`/`read`/`write`
//! loop over it. A zero-byte read means every writer has closed its end —
//! that is surfaced as `IpcError::QueueEof`, a signal a consumer is expected
//! to handle, not an I/O failure.

use std::marker::PhantomData;
use std::os::fd::RawFd;
use std::path::Path;

use log::debug;

use crate::error::{IpcError, QueueError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    Read,
    Write,
}

/// Creates the backing FIFO. Exclusive-creation semantics: fails if a file
/// already exists at `path`.
pub fn create(path: &Path) -> Result<(), IpcError> {
    match nix::unistd::mkfifo(path, nix::sys::stat::Mode::from_bits_truncate(0o644)) {
        Ok(()) => Ok(()),
        Err(e) => Err(QueueError(format!("mkfifo {}: {e}", path.display())).into()),
    }
}

/// Removes the backing FIFO. Best-effort.
pub fn destroy(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("queue destroy {}: {e}", path.display());
        }
    }
}

/// One end of a FIFO, typed over the fixed-size record `T` it carries.
pub struct Queue<T> {
    fd: RawFd,
    mode: QueueMode,
    retry_on_signal: bool,
    _marker: PhantomData<T>,
}

impl<T> Queue<T> {
    /// Opens `path` for this end, retrying on signal interruption. Blocks,
    /// as `open(2)` on a FIFO does, until the other end is also open.
    ///
    /// `retry_on_signal` governs every subsequent `send`/`recv` call: when
    /// `true`, a partial `read`/`write` interrupted by a signal (`EINTR`)
    /// is silently retried — the court workers' choice, so a tide tick or
    /// shutdown signal arriving mid-transfer doesn't fail an otherwise
    /// healthy record. When `false`, the interruption is surfaced as a
    /// `QueueError` instead — the producer's choice, so it notices a
    /// shutdown signal promptly rather than looping on `EINTR` forever.
    pub fn open(path: &Path, mode: QueueMode, retry_on_signal: bool) -> Result<Self, IpcError> {
        let cpath = std::ffi::CString::new(path.as_os_str().as_encoded_bytes())
            .map_err(|_| QueueError(format!("invalid path: {}", path.display())))?;

        let flags = match mode {
            QueueMode::Read => libc::O_RDONLY,
            QueueMode::Write => libc::O_WRONLY,
        };

        let fd = loop {
            let ret = unsafe { libc::open(cpath.as_ptr(), flags) };
            if ret >= 0 {
                break ret;
            }
            if std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(QueueError(format!(
                "open {}: {}",
                path.display(),
                std::io::Error::last_os_error()
            ))
            .into());
        };

        Ok(Self {
            fd,
            mode,
            retry_on_signal,
            _marker: PhantomData,
        })
    }

    /// One syscall attempt, retried on `EINTR` only if `retry_on_signal` is
    /// set; otherwise the interruption is reported as `Err(QueueError)`.
    fn retrying<F>(&self, mut f: F) -> Result<libc::ssize_t, IpcError>
    where
        F: FnMut() -> libc::ssize_t,
    {
        loop {
            let ret = f();
            if ret < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    if self.retry_on_signal {
                        continue;
                    }
                    return Err(QueueError(format!("interrupted: {err}")).into());
                }
                return Err(QueueError(err.to_string()).into());
            }
            return Ok(ret);
        }
    }

    /// Writes one record. Blocks until the write completes.
    pub fn send(&mut self, item: &T) -> Result<(), IpcError>
    where
        T: Copy,
    {
        debug_assert_eq!(self.mode, QueueMode::Write);
        let size = std::mem::size_of::<T>();
        let buf = item as *const T as *const u8;

        let mut written = 0usize;
        while written < size {
            let ret = self.retrying(|| unsafe {
                libc::write(self.fd, buf.add(written) as *const libc::c_void, size - written)
            })?;
            written += ret as usize;
        }
        Ok(())
    }

    /// Reads one record. Returns `IpcError::QueueEof` once every writer has
    /// closed its end (a zero-byte read at a record boundary).
    pub fn recv(&mut self) -> Result<T, IpcError>
    where
        T: Copy,
    {
        debug_assert_eq!(self.mode, QueueMode::Read);
        let size = std::mem::size_of::<T>();
        let mut out = std::mem::MaybeUninit::<T>::uninit();
        let buf = out.as_mut_ptr() as *mut u8;

        let mut read = 0usize;
        while read < size {
            let ret = self.retrying(|| unsafe {
                libc::read(self.fd, buf.add(read) as *mut libc::c_void, size - read)
            })?;
            if ret == 0 {
                if read == 0 {
                    return Err(IpcError::QueueEof);
                }
                return Err(QueueError("partial record at eof".into()).into());
            }
            read += ret as usize;
        }
        Ok(unsafe { out.assume_init() })
    }
}


impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        if unsafe { libc::close(self.fd) } < 0 {
            debug!("queue close fd {}: {}", self.fd, std::io::Error::last_os_error());
        }
    }
}
