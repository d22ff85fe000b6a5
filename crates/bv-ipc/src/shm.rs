//! SysV shared memory segment, typed over an element `T`.
//!
//! Backed directly by `ftok`+`shmget`+`shmat`+`shmdt`+`shmctl`, the way the
//! original implementation's `shared_mem` module does it — there is no
//! shared-memory wrapper in the adopted dependency stack, so this module
//! owns its own `unsafe` the way a systems crate would.

use std::marker::PhantomData;

use log::debug;

use crate::error::{IpcError, SharedMemError};
use crate::key::Key;
use crate::owner::Owner;

/// Creates a shared memory segment for exactly `len` elements of `T`.
/// Exclusive-creation semantics: fails if an object already exists at `key`.
pub fn create<T>(key: &Key, len: usize) -> Result<(), IpcError> {
    let token = key.token()?;
    let size = std::mem::size_of::<T>() * len;

    let shmid = unsafe { libc::shmget(token, size, 0o644 | libc::IPC_CREAT | libc::IPC_EXCL) };
    if shmid < 0 {
        return Err(SharedMemError::Create(std::io::Error::last_os_error().to_string()).into());
    }

    debug!("shm create: key={key} shmid={shmid}");
    Ok(())
}

/// Destroys a shared memory segment. Best-effort: an already-destroyed
/// segment is logged and treated as success.
pub fn destroy(key: &Key) -> Result<(), IpcError> {
    let token = match key.token() {
        Ok(t) => t,
        Err(e) => {
            debug!("shm destroy: {key}: {e}");
            return Ok(());
        }
    };

    let shmid = unsafe { libc::shmget(token, 0, 0o644) };
    if shmid < 0 {
        debug!("shm destroy: {key}: {}", std::io::Error::last_os_error());
        return Ok(());
    }

    if unsafe { libc::shmctl(shmid, libc::IPC_RMID, std::ptr::null_mut()) } < 0 {
        debug!("shm destroy: {key}: {}", std::io::Error::last_os_error());
    } else {
        debug!("shm destroy: key={key} shmid={shmid}");
    }
    Ok(())
}

/// An attached view over a shared memory segment of `len` elements of `T`.
pub struct SharedMem<T> {
    key: Key,
    shmid: i32,
    data: *mut T,
    len: usize,
    owner: Owner,
    _marker: PhantomData<T>,
}

// SAFETY: the pointer refers to kernel shared memory; access is synchronized
// by the byte-range locks layered on top in `bv-players`, not by this type.
unsafe impl<T> Send for SharedMem<T> {}
unsafe impl<T> Sync for SharedMem<T> {}

impl<T> SharedMem<T> {
    fn attach_raw(key: &Key, len: usize, owner: Owner) -> Result<Self, IpcError> {
        let token = key.token()?;
        let size = std::mem::size_of::<T>() * len;

        let shmid = unsafe { libc::shmget(token, size, 0o644) };
        if shmid < 0 {
            return Err(SharedMemError::Attach(std::io::Error::last_os_error().to_string()).into());
        }

        let ptr = unsafe { libc::shmat(shmid, std::ptr::null(), 0) };
        if ptr == usize::MAX as *mut libc::c_void {
            return Err(SharedMemError::Attach(std::io::Error::last_os_error().to_string()).into());
        }

        Ok(Self {
            key: key.clone(),
            shmid,
            data: ptr as *mut T,
            len,
            owner,
            _marker: PhantomData,
        })
    }

    /// Creates the segment and attaches to it, zero-initialized. This
    /// process becomes the creator and is responsible for `Destroy`.
    pub fn create_and_attach(key: &Key, len: usize) -> Result<Self, IpcError> {
        create::<T>(key, len)?;
        let mut mem = Self::attach_raw(key, len, Owner::creator())?;
        mem.zero();
        Ok(mem)
    }

    /// Attaches to a segment created by another process. Never destroys it.
    pub fn attach(key: &Key, len: usize) -> Result<Self, IpcError> {
        Self::attach_raw(key, len, Owner::attached())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_bounds(&self, index: usize, count: usize) -> Result<(), SharedMemError> {
        if count > self.len.saturating_sub(index) {
            return Err(SharedMemError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Bounds-checked bulk read starting at `index`.
    pub fn read(&self, index: usize, out: &mut [T]) -> Result<(), IpcError>
    where
        T: Copy,
    {
        self.check_bounds(index, out.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(self.data.add(index), out.as_mut_ptr(), out.len());
        }
        Ok(())
    }

    /// Bounds-checked bulk write starting at `index`.
    pub fn write(&mut self, index: usize, src: &[T]) -> Result<(), IpcError>
    where
        T: Copy,
    {
        self.check_bounds(index, src.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), self.data.add(index), src.len());
        }
        Ok(())
    }

    /// Returns a raw pointer to the element at `index`, for in-place
    /// mutation under an external lock. Bounds-checked against `len`.
    pub fn get_pointer(&self, index: usize) -> Result<*mut T, IpcError> {
        self.check_bounds(index, 1)?;
        Ok(unsafe { self.data.add(index) })
    }

    /// Fills the whole segment with zero bytes.
    pub fn zero(&mut self) {
        unsafe {
            std::ptr::write_bytes(self.data as *mut u8, 0, self.len * std::mem::size_of::<T>());
        }
    }
}

impl<T> std::ops::Index<usize> for SharedMem<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(index < self.len, "index {index} out of bounds for segment of {} elements", self.len);
        unsafe { &*self.data.add(index) }
    }
}

impl<T> std::ops::IndexMut<usize> for SharedMem<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(index < self.len, "index {index} out of bounds for segment of {} elements", self.len);
        unsafe { &mut *self.data.add(index) }
    }
}


impl<T> Drop for SharedMem<T> {
    fn drop(&mut self) {
        if self.data.is_null() {
            return;
        }

        if unsafe { libc::shmdt(self.data as *const libc::c_void) } < 0 {
            debug!("shm detach: {}: {}", self.key, std::io::Error::last_os_error());
        }
        self.data = std::ptr::null_mut();

        if self.owner.owns() {
            let _ = destroy(&self.key);
        }
    }
}
