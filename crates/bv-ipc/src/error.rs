//! The error taxonomy shared by every IPC primitive in this crate.
//!
//! `IpcError` is the umbrella: lower-level errors convert into it via `From`
//! so `?` composes all the way up to each binary's `main`. `QueueEof` and
//! `RepeatedPair` are control-flow signals a caller is expected to match on,
//! not bugs to log and forget.

use std::fmt;

/// Shared memory attach/create/detach/indexing failures.
#[derive(Debug)]
pub enum SharedMemError {
    Create(String),
    Attach(String),
    Detach(String),
    OutOfBounds { index: usize, len: usize },
}

impl fmt::Display for SharedMemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(msg) => write!(f, "shared memory create: {msg}"),
            Self::Attach(msg) => write!(f, "shared memory attach: {msg}"),
            Self::Detach(msg) => write!(f, "shared memory detach: {msg}"),
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for segment of {len} elements")
            }
        }
    }
}

impl std::error::Error for SharedMemError {}

/// Byte-range lock acquisition failure.
#[derive(Debug)]
pub struct LockError(pub String);

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock: {}", self.0)
    }
}

impl std::error::Error for LockError {}

/// FIFO create/open/read/write failure, other than a clean EOF.
#[derive(Debug)]
pub struct QueueError(pub String);

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue: {}", self.0)
    }
}

impl std::error::Error for QueueError {}

/// Semaphore (barrier) operation failure.
#[derive(Debug)]
pub struct BarrierError(pub String);

impl fmt::Display for BarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "barrier: {}", self.0)
    }
}

impl std::error::Error for BarrierError {}

/// Umbrella error for every kernel IPC failure in the system.
#[derive(Debug)]
pub enum IpcError {
    SharedMem(SharedMemError),
    Lock(LockError),
    Queue(QueueError),
    /// Zero-byte read from a FIFO: all writers have closed their end.
    /// Recoverable — the normal way a queue consumer learns to shut down.
    QueueEof,
    Barrier(BarrierError),
    /// `set_pair` was called on a pair that has already played together.
    RepeatedPair { a: usize, b: usize },
    /// Raised by the child side of `Process::spawn` once its callable has
    /// returned successfully, so the error unwinds cleanly back to the
    /// outermost dispatch instead of being treated as a real failure.
    ChildExit,
    Io(std::io::Error),
}

impl fmt::Display for IpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedMem(e) => write!(f, "{e}"),
            Self::Lock(e) => write!(f, "{e}"),
            Self::Queue(e) => write!(f, "{e}"),
            Self::QueueEof => write!(f, "queue eof"),
            Self::Barrier(e) => write!(f, "{e}"),
            Self::RepeatedPair { a, b } => write!(f, "players {a} and {b} have already played together"),
            Self::ChildExit => write!(f, "child process exit"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for IpcError {}

impl From<SharedMemError> for IpcError {
    fn from(e: SharedMemError) -> Self {
        Self::SharedMem(e)
    }
}

impl From<LockError> for IpcError {
    fn from(e: LockError) -> Self {
        Self::Lock(e)
    }
}

impl From<QueueError> for IpcError {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

impl From<BarrierError> for IpcError {
    fn from(e: BarrierError) -> Self {
        Self::Barrier(e)
    }
}

impl From<std::io::Error> for IpcError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Maps an `IpcError` to the process exit code from the external interface
/// contract (arg errors are handled separately by each binary's CLI layer).
pub fn exit_code(err: &IpcError) -> i32 {
    match err {
        IpcError::SharedMem(_) => 2,
        IpcError::Queue(_) => 2,
        IpcError::QueueEof => 3,
        IpcError::Barrier(_) => 4,
        IpcError::ChildExit => 0,
        IpcError::Lock(_) | IpcError::RepeatedPair { .. } | IpcError::Io(_) => 5,
    }
}
