//! Fixed-size, POD, byte-copied wire records shared by the match and result
//! streams. No framing, no endianness translation: producer and consumer
//! share native ABI.

use bv_core::{PlayerId, Sets};

/// Two distinct player ids forming one side of a match.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub player1: PlayerId,
    pub player2: PlayerId,
}

impl Team {
    pub fn new(player1: PlayerId, player2: PlayerId) -> Self {
        Self { player1, player2 }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player1 == id || self.player2 == id
    }
}

/// Two teams of two, written by the producer and read by a court worker.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub team1: Team,
    pub team2: Team,
}

impl Match {
    pub fn new(team1: Team, team2: Team) -> Self {
        Self { team1, team2 }
    }

    /// All four player ids, in `(team1.player1, team1.player2, team2.player1,
    /// team2.player2)` order.
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team1.player1, self.team1.player2, self.team2.player1, self.team2.player2]
    }
}

/// Whether a court worker finished simulating its match.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Played = 0,
    Interrupted = 1,
}

/// A simulated match outcome, written by a court worker and read by the
/// aggregator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub game: Match,
    pub status: Status,
    /// Unspecified when `status == Interrupted`.
    pub sets_team1: Sets,
    /// Unspecified when `status == Interrupted`.
    pub sets_team2: Sets,
}

impl MatchResult {
    pub fn played(game: Match, sets_team1: Sets, sets_team2: Sets) -> Self {
        Self {
            game,
            status: Status::Played,
            sets_team1,
            sets_team2,
        }
    }

    pub fn interrupted(game: Match) -> Self {
        Self {
            game,
            status: Status::Interrupted,
            sets_team1: 0,
            sets_team2: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_match_lists_all_four_ids_in_team_order() {
        let m = Match::new(Team::new(1, 2), Team::new(3, 4));
        assert_eq!(m.player_ids(), [1, 2, 3, 4]);
    }

    #[test]
    fn team_contains_checks_both_slots() {
        let team = Team::new(5, 6);
        assert!(team.contains(5));
        assert!(team.contains(6));
        assert!(!team.contains(7));
    }

    #[test]
    fn record_sizes_are_pod_friendly() {
        assert_eq!(std::mem::size_of::<Team>(), 8);
        assert_eq!(std::mem::size_of::<Match>(), 16);
    }
}
