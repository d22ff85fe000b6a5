//! Results aggregator binary.
//!
//! Attaches to the players table `main` created, creates the `match_out`
//! and `redirect` streams, forks the scoreboard child, then runs the
//! aggregator loop until shutdown.

use std::path::PathBuf;

use bv_core::discriminator;
use bv_ipc::error::{exit_code, IpcError};
use bv_ipc::key::Key;
use bv_ipc::process::Process;
use bv_ipc::queue::QueueMode;
use bv_ipc::signal;
use bv_players::PlayersTable;

#[derive(Parser, Debug)]
#[command(author, version, about = "Beach-volley results aggregator", long_about = None)]
struct Args {
    /// Maximum number of players the shared table has room for. Must match
    /// the value `main` was started with.
    #[arg(long)]
    max_players: usize,
    /// Maximum number of partnerships a player may record. Must match the
    /// value `main` was started with.
    #[arg(long)]
    max_matches: usize,
    /// Path of the result stream this process reads from.
    #[arg(long, default_value = bv_core::DEFAULT_MATCH_OUT)]
    match_out: String,
    /// Path of the result stream the scoreboard child reads from.
    #[arg(long, default_value = bv_core::DEFAULT_REDIRECT)]
    redirect: String,
    /// Backing file for the `ftok`-derived shared memory and semaphore keys.
    /// Must name the same file `main` was started with.
    #[arg(long, default_value = bv_core::DEFAULT_KEY_PATH)]
    key_path: String,
}

fn run(args: Args) -> Result<(), IpcError> {
    signal::install_handlers()?;

    let key_path = PathBuf::from(&args.key_path);
    if !key_path.exists() {
        return Err(IpcError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("key path {} does not exist yet; start `main` first", key_path.display()),
        )));
    }

    let players_key = Key::new(&key_path, discriminator::PLAYERS_TABLE);
    let lock_path = key_path.with_extension("players.lock");
    let table = PlayersTable::attach(&players_key, &lock_path, args.max_players, args.max_matches)?;

    let match_out_path = PathBuf::from(&args.match_out);
    let redirect_path = PathBuf::from(&args.redirect);
    bv_ipc::queue::create(&match_out_path)?;
    bv_ipc::queue::create(&redirect_path)?;

    let scoreboard_redirect_path = redirect_path.clone();
    let mut scoreboard_process = Process::spawn(move || {
        // The scoreboard is a worker, not the producer: retry on signal
        // interruption rather than surfacing it (§4.7/§5).
        let mut redirect_in = bv_pipeline::ResultQueue::open(&scoreboard_redirect_path, QueueMode::Read, true)?;
        let mut board = bv_sim::Scoreboard::new();
        board.run(&mut redirect_in)?;
        log::info!("final standings:\n{}", board.render());
        Ok(())
    })?;

    // The aggregator is a single top-level coordinator, the same role the
    // producer plays on the match_in side, so it surfaces signal
    // interruptions instead of retrying them (see DESIGN.md).
    let mut redirect_out = bv_pipeline::ResultQueue::open(&redirect_path, QueueMode::Write, false)?;
    let mut match_out = bv_pipeline::ResultQueue::open(&match_out_path, QueueMode::Read, false)?;

    log::info!("aggregator ready: max_players={} max_matches={}", args.max_players, args.max_matches);
    bv_sim::aggregator::run(&table, &mut match_out, &mut redirect_out)?;

    log::info!("shutting down, waiting for scoreboard");
    drop(redirect_out);
    scoreboard_process.wait()?;

    bv_ipc::queue::destroy(&match_out_path);
    bv_ipc::queue::destroy(&redirect_path);
    drop(table);

    Ok(())
}

fn main() {
    bv_core::init_logging();

    let args: Args = bv_core::parse_args_or_exit();
    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(IpcError::ChildExit) => std::process::exit(0),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(exit_code(&e));
        }
    }
}
