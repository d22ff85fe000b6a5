//! The scoreboard: a running id→points map fed by the redirect stream,
//! rendered as a table ordered by descending points (ties broken by
//! ascending id).

use std::collections::HashMap;

use bv_core::PlayerId;
use bv_ipc::error::IpcError;
use bv_ipc::signal::quit_requested;
use bv_pipeline::{ranking_points, ResultQueue, Status};

#[derive(Debug, Default)]
pub struct Scoreboard {
    points: HashMap<PlayerId, u64>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one result into the running totals. Interrupted results are
    /// ignored, matching the aggregator's choice not to forward them.
    pub fn record(&mut self, result: &bv_pipeline::MatchResult) {
        if result.status != Status::Played {
            return;
        }

        let (points1, points2) = ranking_points(result.sets_team1, result.sets_team2);
        let team1 = result.game.team1;
        let team2 = result.game.team2;

        *self.points.entry(team1.player1).or_insert(0) += points1 as u64;
        *self.points.entry(team1.player2).or_insert(0) += points1 as u64;
        *self.points.entry(team2.player1).or_insert(0) += points2 as u64;
        *self.points.entry(team2.player2).or_insert(0) += points2 as u64;
    }

    /// The current standings, sorted by descending points, ties broken by
    /// ascending id.
    pub fn ranking(&self) -> Vec<(PlayerId, u64)> {
        let mut rows: Vec<_> = self.points.iter().map(|(&id, &points)| (id, points)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows
    }

    pub fn render(&self) -> String {
        let mut out = String::from("rank  player  points\n");
        for (rank, (id, points)) in self.ranking().into_iter().enumerate() {
            out.push_str(&format!("{:>4}  {:>6}  {:>6}\n", rank + 1, id, points));
        }
        out
    }

    /// Consumes the redirect stream until shutdown or queue EOF.
    pub fn run(&mut self, redirect: &mut ResultQueue) -> Result<(), IpcError> {
        while !quit_requested() {
            match redirect.recv() {
                Ok(result) => self.record(&result),
                Err(IpcError::QueueEof) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_pipeline::{Match, MatchResult, Team};

    #[test]
    fn ranking_orders_by_points_then_ascending_id() {
        let mut board = Scoreboard::new();
        let game = Match::new(Team::new(1, 2), Team::new(3, 4));
        board.record(&MatchResult::played(game, 3, 0));
        board.record(&MatchResult::played(game, 3, 1));

        assert_eq!(board.ranking(), vec![(1, 6), (2, 6), (3, 0), (4, 0)]);
    }

    #[test]
    fn interrupted_results_do_not_contribute_points() {
        let mut board = Scoreboard::new();
        let game = Match::new(Team::new(1, 2), Team::new(3, 4));
        board.record(&MatchResult::interrupted(game));
        assert!(board.ranking().is_empty());
    }

    #[test]
    fn a_five_setter_splits_points_two_and_one() {
        let mut board = Scoreboard::new();
        let game = Match::new(Team::new(1, 2), Team::new(3, 4));
        board.record(&MatchResult::played(game, 3, 2));
        assert_eq!(board.ranking(), vec![(1, 2), (2, 2), (3, 1), (4, 1)]);
    }
}
