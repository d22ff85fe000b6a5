//! Kernel IPC primitives: shared memory, byte-range locks, FIFO queues,
//! semaphore barriers, fork-based process spawning and the ownership
//! discipline that decides which process tears each of them down.
//!
//! - [`shm`] — SysV shared memory segments typed over an element.
//! - [`lock`] — `fcntl` byte-range advisory locks, released on `Drop`.
//! - [`queue`] — named FIFOs carrying fixed-size records.
//! - [`barrier`] — SysV semaphores used as single-value gates.
//! - [`process`] — `fork`+`waitpid` wrapped around a child closure.
//! - [`signal`] — the process-wide shutdown flag.
//! - [`key`] — `ftok`-derived identifiers shared across processes.
//! - [`owner`] — tracks which process created a kernel object.
//! - [`error`] — the error taxonomy every primitive above converts into.

pub mod barrier;
pub mod error;
pub mod key;
pub mod lock;
pub mod owner;
pub mod process;
pub mod queue;
pub mod shm;
pub mod signal;

pub use barrier::Barrier;
pub use error::IpcError;
pub use key::Key;
pub use lock::{Lock, Mode as LockMode};
pub use owner::Owner;
pub use process::Process;
pub use queue::{Queue, QueueMode};
pub use shm::SharedMem;
