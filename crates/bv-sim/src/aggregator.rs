//! The results aggregator: reset played-out players to idle, record
//! partnerships, and forward played results downstream.

use bv_ipc::error::IpcError;
use bv_ipc::signal::quit_requested;
use bv_pipeline::{MatchResult, ResultQueue, Status};
use bv_players::{PlayerState, PlayersTable};

/// Resets the four players in `result` to idle and, for a played match,
/// records both within-team partnerships. Write locks on all four players
/// are acquired in ascending id order, matching the producer's own
/// acquisition order, so the two processes can never deadlock against each
/// other.
fn apply_result(table: &PlayersTable, result: &MatchResult) -> Result<(), IpcError> {
    let mut ids = result.game.player_ids();
    ids.sort_unstable();

    let handles: Vec<_> = ids.iter().map(|&id| table.get_player(id)).collect::<Result<_, _>>()?;

    for handle in &handles {
        handle.set_state(PlayerState::Idle);
    }

    if result.status == Status::Played {
        let find = |id| handles.iter().find(|h| h.id() == id).expect("id came from this result's own handles");
        let team1 = result.game.team1;
        let team2 = result.game.team2;

        if let Err(e) = find(team1.player1).set_pair(find(team1.player2)) {
            log::warn!("recording partnership {}-{}: {e}", team1.player1, team1.player2);
        }
        if let Err(e) = find(team2.player1).set_pair(find(team2.player2)) {
            log::warn!("recording partnership {}-{}: {e}", team2.player1, team2.player2);
        }
    }

    Ok(())
}

/// Runs the aggregator until shutdown or queue EOF.
pub fn run(table: &PlayersTable, match_out: &mut ResultQueue, redirect: &mut ResultQueue) -> Result<(), IpcError> {
    while !quit_requested() {
        let result = match match_out.recv() {
            Ok(result) => result,
            Err(IpcError::QueueEof) => break,
            Err(e) => return Err(e),
        };

        apply_result(table, &result)?;

        if result.status == Status::Played {
            redirect.send(&result)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_ipc::key::Key;
    use bv_pipeline::{Match, MatchResult, Team};

    fn scratch(name: &str) -> (Key, std::path::PathBuf) {
        let pid = std::process::id();
        let base = std::env::temp_dir().join(format!("bv-sim-aggregator-test-{name}-{pid}"));
        std::fs::File::create(&base).unwrap();
        let lock_path = std::env::temp_dir().join(format!("bv-sim-aggregator-test-{name}-{pid}.lock"));
        (Key::new(base, 1), lock_path)
    }

    fn four_playing_players(table: &mut PlayersTable) {
        for _ in 0..4 {
            let id = table.add_player().unwrap();
            table.get_player(id).unwrap().set_state(PlayerState::Playing);
        }
    }

    #[test]
    fn a_played_result_frees_all_four_players_and_records_partnerships() {
        let (key, lock_path) = scratch("played");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        four_playing_players(&mut table);

        let game = Match::new(Team::new(1, 2), Team::new(3, 4));
        apply_result(&table, &MatchResult::played(game, 3, 1)).unwrap();

        for id in 1..=4 {
            let p = table.get_player_ro(id).unwrap();
            assert_eq!(p.state(), PlayerState::Idle);
        }
        assert!(table.get_player_ro(1).unwrap().has_played_with(2));
        assert!(table.get_player_ro(3).unwrap().has_played_with(4));
        assert!(!table.get_player_ro(1).unwrap().has_played_with(3));
    }

    #[test]
    fn an_interrupted_result_frees_players_without_recording_partnerships() {
        let (key, lock_path) = scratch("interrupted");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        four_playing_players(&mut table);

        let game = Match::new(Team::new(1, 2), Team::new(3, 4));
        apply_result(&table, &MatchResult::interrupted(game)).unwrap();

        for id in 1..=4 {
            let p = table.get_player_ro(id).unwrap();
            assert_eq!(p.state(), PlayerState::Idle);
            assert_eq!(p.num_matches(), 0);
        }
    }
}
