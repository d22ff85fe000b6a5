use std::ffi::CString;
use std::path::{Path, PathBuf};

use crate::error::IpcError;

/// A `(path, discriminator)` pair that deterministically maps to a SysV IPC
/// identifier via `ftok(3)`. The path must name a file that exists and is
/// visible to every process that wants to observe the same kernel object;
/// the discriminator lets several logically distinct objects (the players
/// table, the tide barriers, one per row) share a single backing path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    path: PathBuf,
    discriminator: u8,
}

impl Key {
    pub fn new(path: impl Into<PathBuf>, discriminator: u8) -> Self {
        Self {
            path: path.into(),
            discriminator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn discriminator(&self) -> u8 {
        self.discriminator
    }

    /// Derives the SysV `key_t` token for this key via `ftok`. The backing
    /// path must already exist; `ftok` fails with `ENOENT` otherwise.
    pub fn token(&self) -> Result<libc::key_t, IpcError> {
        let cpath = CString::new(self.path.as_os_str().as_encoded_bytes())
            .map_err(|_| IpcError::SharedMem(crate::error::SharedMemError::Create(
                format!("invalid path: {}", self.path.display()),
            )))?;

        let token = unsafe { libc::ftok(cpath.as_ptr(), self.discriminator as i32) };
        if token == -1 {
            return Err(IpcError::Io(std::io::Error::last_os_error()));
        }
        Ok(token)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.path.display(), self.discriminator)
    }
}
