//! The match/result pipeline's wire records and scoring rules.
//!
//! - [`record`] — `Team`, `Match`, `MatchResult`, `Status`.
//! - [`queues`] — typed `Queue` aliases for the two record kinds.
//! - [`ranking`] — the fixed points table for played matches.

pub mod queues;
pub mod ranking;
pub mod record;

pub use queues::{MatchQueue, ResultQueue};
pub use ranking::ranking_points;
pub use record::{Match, MatchResult, Status, Team};
