//! Team formation and the match producer loop.

use std::time::Duration;

use bv_core::{PlayerId, NO_PAIR_BACKOFF_SECS};
use bv_ipc::error::IpcError;
use bv_ipc::signal::quit_requested;
use bv_pipeline::{Match, MatchQueue, Team};
use bv_players::{PlayerState, PlayersTable};

/// Scans for the first idle, under-quota player, then for a second such
/// player who is not already a partner of the first. Ascending id order,
/// first match wins — ties among equally-eligible pairs are broken
/// deterministically by scan order.
fn find_pairing(table: &PlayersTable) -> Result<Option<(PlayerId, PlayerId)>, IpcError> {
    let n = table.size() as PlayerId;
    let max_matches = table.max_matches();

    for p1 in 1..=n {
        let candidate1 = table.get_player(p1)?;
        if candidate1.state() != PlayerState::Idle || candidate1.num_matches() >= max_matches {
            continue;
        }

        for p2 in (p1 + 1)..=n {
            let candidate2 = table.get_player(p2)?;
            if candidate2.state() == PlayerState::Idle
                && candidate2.num_matches() < max_matches
                && !candidate1.has_played_with(p2)
            {
                candidate1.set_state(PlayerState::Playing);
                candidate2.set_state(PlayerState::Playing);
                return Ok(Some((p1, p2)));
            }
        }
    }
    Ok(None)
}

/// Forms one match of two teams. Transitioning a player to `Playing`
/// removes them from consideration by the next `find_pairing` call, so the
/// second team is naturally disjoint from the first; if no second team can
/// be found, the first team's players are reverted to idle and `None` is
/// returned.
pub fn form_match(table: &PlayersTable) -> Result<Option<Match>, IpcError> {
    let Some((p1, p2)) = find_pairing(table)? else {
        return Ok(None);
    };

    match find_pairing(table)? {
        Some((p3, p4)) => Ok(Some(Match::new(Team::new(p1, p2), Team::new(p3, p4)))),
        None => {
            table.get_player(p1)?.set_state(PlayerState::Idle);
            table.get_player(p2)?.set_state(PlayerState::Idle);
            Ok(None)
        }
    }
}

/// Runs the producer until shutdown: form a match and publish it, or back
/// off for a second and retry if no pair is currently available.
pub fn run(table: &PlayersTable, matches_out: &mut MatchQueue) -> Result<(), IpcError> {
    while !quit_requested() {
        match form_match(table)? {
            Some(game) => matches_out.send(&game)?,
            None => {
                log::info!("no pairs found");
                std::thread::sleep(Duration::from_secs(NO_PAIR_BACKOFF_SECS));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_ipc::key::Key;

    fn scratch(name: &str) -> (Key, std::path::PathBuf) {
        let pid = std::process::id();
        let base = std::env::temp_dir().join(format!("bv-sim-producer-test-{name}-{pid}"));
        std::fs::File::create(&base).unwrap();
        let lock_path = std::env::temp_dir().join(format!("bv-sim-producer-test-{name}-{pid}.lock"));
        (Key::new(base, 1), lock_path)
    }

    #[test]
    fn reverts_the_first_team_to_idle_when_no_second_team_exists() {
        let (key, lock_path) = scratch("revert");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        table.add_player().unwrap();
        table.add_player().unwrap();

        assert!(form_match(&table).unwrap().is_none());

        let p1 = table.get_player_ro(1).unwrap();
        let p2 = table.get_player_ro(2).unwrap();
        assert_eq!(p1.state(), PlayerState::Idle);
        assert_eq!(p2.state(), PlayerState::Idle);
    }

    #[test]
    fn no_pair_found_with_a_single_idle_player() {
        let (key, lock_path) = scratch("lonely");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        table.add_player().unwrap();
        assert!(form_match(&table).unwrap().is_none());
    }

    #[test]
    fn players_who_already_partnered_are_not_repaired() {
        let (key, lock_path) = scratch("repeat");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        let a = table.add_player().unwrap();
        let b = table.add_player().unwrap();
        {
            let pa = table.get_player(a).unwrap();
            let pb = table.get_player(b).unwrap();
            pa.set_pair(&pb).unwrap();
            pa.set_state(PlayerState::Idle);
            pb.set_state(PlayerState::Idle);
        }
        assert!(form_match(&table).unwrap().is_none());
    }

    #[test]
    fn a_match_needs_four_distinct_idle_players() {
        let (key, lock_path) = scratch("four");
        let mut table = PlayersTable::create(&key, &lock_path, 10, 5).unwrap();
        for _ in 0..4 {
            table.add_player().unwrap();
        }
        let game = form_match(&table).unwrap().unwrap();
        let mut ids = game.player_ids();
        ids.sort_unstable();
        assert_eq!(ids, [1, 2, 3, 4]);
    }
}
