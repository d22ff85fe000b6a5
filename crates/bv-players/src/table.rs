//! The shared players table: one shared memory segment of machine words,
//! with per-player byte-range locks carved out of a single dedicated file
//! descriptor.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::Path;

use bv_core::PlayerId;
use bv_ipc::error::{IpcError, SharedMemError};
use bv_ipc::key::Key;
use bv_ipc::lock::{Lock, Mode};
use bv_ipc::shm::SharedMem;

use crate::state::PlayerState;

/// Word offset and stride within a player's record.
const STATE_OFFSET: usize = 0;
const K_OFFSET: usize = 1;
const PARTNERS_OFFSET: usize = 2;

/// A contiguous region of `u32` words: `N` followed by `P` fixed-size player
/// records of `M + 2` words each.
pub struct PlayersTable {
    mem: SharedMem<u32>,
    lock_file: File,
    capacity: usize,
    max_matches: usize,
}

impl PlayersTable {
    fn record_stride(max_matches: usize) -> usize {
        max_matches + 2
    }

    fn segment_len(capacity: usize, max_matches: usize) -> usize {
        1 + capacity * Self::record_stride(max_matches)
    }

    /// Creates and zero-initializes the segment, and creates the backing
    /// lock file if it does not already exist. The caller becomes the
    /// table's sole creator and is responsible for dropping it last.
    pub fn create(key: &Key, lock_path: &Path, capacity: usize, max_matches: usize) -> Result<Self, IpcError> {
        let mem = SharedMem::create_and_attach(key, Self::segment_len(capacity, max_matches))?;
        let lock_file = OpenOptions::new().read(true).write(true).create(true).open(lock_path)?;
        Ok(Self {
            mem,
            lock_file,
            capacity,
            max_matches,
        })
    }

    /// Attaches to a segment created by another process.
    pub fn attach(key: &Key, lock_path: &Path, capacity: usize, max_matches: usize) -> Result<Self, IpcError> {
        let mem = SharedMem::attach(key, Self::segment_len(capacity, max_matches))?;
        let lock_file = OpenOptions::new().read(true).write(true).open(lock_path)?;
        Ok(Self {
            mem,
            lock_file,
            capacity,
            max_matches,
        })
    }

    /// Maximum number of partnerships a player may record.
    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Maximum number of players the segment has room for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current player count, word 0 of the segment.
    pub fn size(&self) -> usize {
        self.mem[0] as usize
    }

    fn record_offset(&self, id: PlayerId) -> usize {
        1 + (id as usize - 1) * Self::record_stride(self.max_matches)
    }

    fn check_id(&self, id: PlayerId) -> Result<(), IpcError> {
        let size = self.size();
        if id == 0 || id as usize > size {
            return Err(SharedMemError::OutOfBounds {
                index: id as usize,
                len: size,
            }
            .into());
        }
        Ok(())
    }

    /// Appends a new idle player with no recorded partnerships, returning
    /// its id. Single-producer: concurrent callers are not synchronized.
    pub fn add_player(&mut self) -> Result<PlayerId, IpcError> {
        let n = self.size();
        if n >= self.capacity {
            return Err(SharedMemError::OutOfBounds {
                index: n,
                len: self.capacity,
            }
            .into());
        }

        let id = (n + 1) as PlayerId;
        let offset = self.record_offset(id);
        let stride = Self::record_stride(self.max_matches);
        for word in 0..stride {
            self.mem[offset + word] = 0;
        }
        self.mem[offset + STATE_OFFSET] = PlayerState::Idle.as_word();
        self.mem[0] = id;
        Ok(id)
    }

    /// Acquires a write lock on `id`'s one-word range. Blocks until granted.
    pub fn get_player(&self, id: PlayerId) -> Result<WritablePlayer<'_>, IpcError> {
        self.check_id(id)?;
        let lock = Lock::acquire(self.lock_file.as_raw_fd(), Mode::Write, id as i64, 1)?;
        Ok(WritablePlayer {
            table: self,
            id,
            offset: self.record_offset(id),
            _lock: lock,
        })
    }

    /// Acquires a read lock on `id`'s one-word range. Blocks until granted.
    pub fn get_player_ro(&self, id: PlayerId) -> Result<ReadOnlyPlayer<'_>, IpcError> {
        self.check_id(id)?;
        let lock = Lock::acquire(self.lock_file.as_raw_fd(), Mode::Read, id as i64, 1)?;
        Ok(ReadOnlyPlayer {
            table: self,
            id,
            offset: self.record_offset(id),
            _lock: lock,
        })
    }

    /// Read-only handles for ids `1..=size()`, in order. Each dereference
    /// takes a fresh lock; no lock is held between elements.
    pub fn iter(&self) -> PlayersIter<'_> {
        PlayersIter {
            table: self,
            next: 1,
            len: self.size(),
        }
    }

    fn word_at(&self, offset: usize) -> u32 {
        self.mem[offset]
    }

    fn set_word_at(&self, offset: usize, value: u32) {
        // SAFETY: offset was derived from a checked player id and the lock
        // held by the calling handle serializes this write against any
        // other accessor of the same id.
        unsafe {
            *self.mem.get_pointer(offset).expect("offset within segment bounds") = value;
        }
    }
}

/// A read-only accessor for one player, holding a read lock for its
/// lifetime.
pub struct ReadOnlyPlayer<'a> {
    table: &'a PlayersTable,
    id: PlayerId,
    offset: usize,
    _lock: Lock,
}

/// A write accessor for one player, holding a write lock for its lifetime.
pub struct WritablePlayer<'a> {
    table: &'a PlayersTable,
    id: PlayerId,
    offset: usize,
    _lock: Lock,
}

macro_rules! impl_player_reads {
    ($ty:ident) => {
        impl<'a> $ty<'a> {
            pub fn id(&self) -> PlayerId {
                self.id
            }

            pub fn state(&self) -> PlayerState {
                let word = self.table.word_at(self.offset + STATE_OFFSET);
                PlayerState::try_from(word).unwrap_or(PlayerState::Unavailable)
            }

            pub fn num_matches(&self) -> usize {
                self.table.word_at(self.offset + K_OFFSET) as usize
            }

            pub fn partners(&self) -> Vec<PlayerId> {
                let k = self.num_matches();
                (0..k)
                    .map(|i| self.table.word_at(self.offset + PARTNERS_OFFSET + i))
                    .collect()
            }

            pub fn has_played_with(&self, other: PlayerId) -> bool {
                let k = self.num_matches();
                (0..k).any(|i| self.table.word_at(self.offset + PARTNERS_OFFSET + i) == other)
            }
        }
    };
}

impl_player_reads!(ReadOnlyPlayer);
impl_player_reads!(WritablePlayer);

impl<'a> WritablePlayer<'a> {
    pub fn set_state(&self, state: PlayerState) {
        self.table.set_word_at(self.offset + STATE_OFFSET, state.as_word());
    }

    fn append_partner(&self, other: PlayerId) {
        let k = self.num_matches();
        self.table
            .set_word_at(self.offset + PARTNERS_OFFSET + k, other);
        self.table.set_word_at(self.offset + K_OFFSET, (k + 1) as u32);
    }

    /// Records a new partnership between `self` and `other`. Fails with
    /// `RepeatedPair` without mutating either record if they have already
    /// played together. Callers must hold both handles in ascending-id
    /// order to avoid deadlock.
    pub fn set_pair(&self, other: &WritablePlayer<'_>) -> Result<(), IpcError> {
        if self.has_played_with(other.id()) || other.has_played_with(self.id()) {
            return Err(IpcError::RepeatedPair {
                a: self.id() as usize,
                b: other.id() as usize,
            });
        }
        self.append_partner(other.id());
        other.append_partner(self.id());
        Ok(())
    }
}

/// Iterates read-only handles for ids `1..=size()` as of iterator creation.
pub struct PlayersIter<'a> {
    table: &'a PlayersTable,
    next: u32,
    len: usize,
}

impl<'a> Iterator for PlayersIter<'a> {
    type Item = Result<ReadOnlyPlayer<'a>, IpcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next as usize > self.len {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(self.table.get_player_ro(id))
    }
}
