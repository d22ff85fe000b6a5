//! Named convenience aliases over [`bv_ipc::queue::Queue`] for the two
//! record types that flow through the pipeline.

use bv_ipc::queue::Queue;

use crate::record::{Match, MatchResult};

/// The producer → court-worker stream.
pub type MatchQueue = Queue<Match>;
/// The court-worker → aggregator, and aggregator → scoreboard, streams.
pub type ResultQueue = Queue<MatchResult>;
