//! The shared players table.
//!
//! - [`table::PlayersTable`] — the shared memory segment, append-only
//!   registration, and lock-gated handle accessors.
//! - [`state::PlayerState`] — the four-state lifecycle stored per player.

pub mod state;
pub mod table;

pub use state::PlayerState;
pub use table::{PlayersIter, PlayersTable, ReadOnlyPlayer, WritablePlayer};
