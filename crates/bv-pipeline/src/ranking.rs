//! The fixed ranking points table for played matches.

use bv_core::Sets;

/// Points awarded to the winning and losing team for a played match, given
/// each team's set count. Only one of `sets_team1`/`sets_team2` is 3 (a
/// played match always has a team that took exactly 3 sets); the other
/// value is how many sets the loser took.
///
/// Returns `(points_team1, points_team2)`.
pub fn ranking_points(sets_team1: Sets, sets_team2: Sets) -> (u32, u32) {
    let team1_won = sets_team1 == 3;
    let loser_sets = if team1_won { sets_team2 } else { sets_team1 };

    let (winner_points, loser_points) = if loser_sets <= 1 { (3, 0) } else { (2, 1) };

    if team1_won {
        (winner_points, loser_points)
    } else {
        (loser_points, winner_points)
    }
}
