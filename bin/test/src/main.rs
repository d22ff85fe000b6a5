//! Standalone smoke test for the shared players table.
//!
//! Mirrors the original implementation's dedicated `test` binary: it walks
//! through the scenarios from §8 of the specification (the players table's
//! concurrency invariants) as a fixed sequence of assertions rather than a
//! fuzzed property test, since `fork()`-based interleavings aren't
//! reproducibly generatable by a property-testing crate. Exercises
//! cross-process visibility by forking a child that observes and mutates
//! the same shared memory segment, then asserting the parent sees its
//! writes after the child exits.

use bv_ipc::error::{exit_code, IpcError};
use bv_ipc::key::Key;
use bv_ipc::process::Process;
use bv_players::{PlayerState, PlayersTable};

const MAX_PLAYERS: usize = 15;
const MAX_MATCHES: usize = 8;

/// Runs entirely in the forked child: observes player 5 and 10 (registered
/// and paired by the parent before the fork) and flips player 6 to
/// `Playing`, a state the parent asserts on after the child exits.
fn observe_and_mutate_in_child(table: &PlayersTable) -> Result<(), IpcError> {
    let p5 = table.get_player_ro(5)?;
    let p10 = table.get_player_ro(10)?;
    assert!(p5.has_played_with(10), "child should see the parent's pairing of 5 and 10");
    assert!(p10.has_played_with(5));
    assert_eq!(p5.num_matches(), 1);

    let p6 = table.get_player(6)?;
    assert_eq!(p6.state(), PlayerState::Idle);
    p6.set_state(PlayerState::Playing);

    Ok(())
}

fn run() -> Result<(), IpcError> {
    let pid = std::process::id();
    let key_path = std::env::temp_dir().join(format!("bv-integration-test-{pid}.key"));
    std::fs::File::create(&key_path)?;
    let lock_path = key_path.with_extension("lock");
    let key = Key::new(&key_path, 1);

    let mut table = PlayersTable::create(&key, &lock_path, MAX_PLAYERS, MAX_MATCHES)?;
    assert_eq!(table.size(), 0);

    let p1 = table.add_player()?;
    assert_eq!(p1, 1);
    assert_eq!(table.size(), 1);
    {
        let p1 = table.get_player_ro(p1)?;
        assert_eq!(p1.state(), PlayerState::Idle);
        assert_eq!(p1.num_matches(), 0);
    }

    let p2 = table.add_player()?;
    assert_eq!(p2, 2);
    assert_eq!(table.size(), 2);

    {
        let h1 = table.get_player(p1)?;
        let h2 = table.get_player(p2)?;
        assert!(!h1.has_played_with(p2));
        h1.set_pair(&h2)?;
        assert!(h1.has_played_with(p2));
        assert!(h2.has_played_with(p1));
        assert_eq!(h1.num_matches(), 1);
        assert_eq!(h2.num_matches(), 1);
    }

    // re-pairing the same two players is rejected without mutating state
    {
        let h1 = table.get_player(p1)?;
        let h2 = table.get_player(p2)?;
        assert!(matches!(h1.set_pair(&h2), Err(IpcError::RepeatedPair { .. })));
        assert_eq!(h1.num_matches(), 1);
    }

    // register up through player 14, pairing 5 with 10 along the way, so
    // the forked child below has real state to observe cross-process
    while table.size() < 14 {
        table.add_player()?;
    }
    assert_eq!(table.size(), 14);
    {
        let p5 = table.get_player(5)?;
        let p10 = table.get_player(10)?;
        p5.set_pair(&p10)?;
    }

    let mut child = Process::spawn(|| observe_and_mutate_in_child(&table))?;
    let child_exit = child.wait()?;
    assert_eq!(child_exit, 0, "child process should exit cleanly");

    // the child's write is visible here only because both processes attach
    // the same SysV shared memory segment; this is the cross-process
    // visibility invariant §8.9 is about.
    let p6 = table.get_player_ro(6)?;
    assert_eq!(p6.state(), PlayerState::Playing);

    // concurrent readers of distinct players do not contend (§8.8)
    let p7 = table.get_player_ro(7)?;
    let p9 = table.get_player_ro(9)?;
    assert_eq!(p7.num_matches(), 0);
    assert_eq!(p9.num_matches(), 0);
    drop(p7);
    drop(p9);

    drop(table);
    println!("OK!");
    Ok(())
}

fn main() {
    bv_core::init_logging();

    match run() {
        Ok(()) => std::process::exit(0),
        Err(IpcError::ChildExit) => std::process::exit(0),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(exit_code(&e));
        }
    }
}
