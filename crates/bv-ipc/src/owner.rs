//! Resource ownership token.
//!
//! Every kernel IPC object in this crate embeds an `Owner`, recording which
//! process created it. Teardown only runs when the embedding type is dropped
//! in the process that created it; in a forked child, `Owner::owns` is
//! false and the corresponding `Drop` impl becomes a no-op. This is what
//! keeps a forked court worker or scoreboard child from reclaiming a
//! segment, semaphore or FIFO that its parent is still using.

/// Tracks the creating process so that `Drop` impls can tell whether they
/// are running in the creator or in a process that merely attached.
#[derive(Debug, Clone, Copy)]
pub struct Owner {
    creator_pid: Option<u32>,
}

impl Owner {
    /// An owner for an object this process just created.
    pub fn creator() -> Self {
        Self {
            creator_pid: Some(std::process::id()),
        }
    }

    /// An owner for an object this process merely attached to; its `Drop`
    /// side is always a no-op.
    pub fn attached() -> Self {
        Self { creator_pid: None }
    }

    /// True only when called in the process that created the object.
    pub fn owns(&self) -> bool {
        matches!(self.creator_pid, Some(pid) if pid == std::process::id())
    }
}
