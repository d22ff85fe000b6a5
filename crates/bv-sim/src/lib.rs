//! The four process roles of the tournament pipeline.
//!
//! - [`producer`] — team formation and the match producer loop.
//! - [`court`] — the per-court worker loop.
//! - [`aggregator`] — resets players to idle and records partnerships.
//! - [`scoreboard`] — the running ranking fed by the redirect stream.

pub mod aggregator;
pub mod court;
pub mod producer;
pub mod scoreboard;

pub use scoreboard::Scoreboard;
