//! Match producer binary.
//!
//! Owns the players table and the `match_in` stream: creates both, forks
//! the tide controller, then runs the team-formation loop until shutdown.

use std::path::PathBuf;

use bv_core::discriminator;
use bv_ipc::error::{exit_code, IpcError};
use bv_ipc::key::Key;
use bv_ipc::process::Process;
use bv_ipc::queue::QueueMode;
use bv_ipc::signal;
use bv_players::PlayersTable;
use bv_tide::TideScheduler;

#[derive(Parser, Debug)]
#[command(author, version, about = "Beach-volley match producer", long_about = None)]
struct Args {
    /// Maximum number of players the shared table has room for.
    #[arg(long)]
    max_players: usize,
    /// Maximum number of partnerships a player may record.
    #[arg(long)]
    max_matches: usize,
    /// Number of court rows; one tide barrier is created per row.
    #[arg(long)]
    rows: usize,
    /// Path of the match stream this process writes to.
    #[arg(long, default_value = bv_core::DEFAULT_MATCH_IN)]
    match_in: String,
    /// Backing file for the `ftok`-derived shared memory and semaphore keys.
    #[arg(long, default_value = bv_core::DEFAULT_KEY_PATH)]
    key_path: String,
}

fn run(args: Args) -> Result<(), IpcError> {
    signal::install_handlers()?;

    let key_path = PathBuf::from(&args.key_path);
    if !key_path.exists() {
        std::fs::File::create(&key_path)?;
    }

    let players_key = Key::new(&key_path, discriminator::PLAYERS_TABLE);
    let lock_path = key_path.with_extension("players.lock");
    let mut table = PlayersTable::create(&players_key, &lock_path, args.max_players, args.max_matches)?;

    // The table has no registration interface of its own (§4.3 treats adds
    // as single-producer); the producer is that producer, so it fills the
    // roster to capacity once at startup before anyone else attaches.
    for _ in 0..args.max_players {
        table.add_player()?;
    }
    log::info!("registered {} players", table.size());

    let match_in_path = PathBuf::from(&args.match_in);
    bv_ipc::queue::create(&match_in_path)?;
    // The producer surfaces signal interruptions rather than retrying them,
    // so a shutdown signal arriving mid-write is noticed promptly (§4.7/§5).
    let mut match_queue = bv_pipeline::MatchQueue::open(&match_in_path, QueueMode::Write, false)?;

    let tide = TideScheduler::create(&key_path, args.rows)?;
    let rows = args.rows;
    let tide_key_path = key_path.clone();
    let mut tide_process = Process::spawn(move || {
        let mut child_tide = TideScheduler::attach(&tide_key_path, rows)?;
        let mut rng = rand::rng();
        child_tide.run(&mut rng)
    })?;

    log::info!("producer ready: max_players={} max_matches={} rows={rows}", args.max_players, args.max_matches);
    bv_sim::producer::run(&table, &mut match_queue)?;

    log::info!("shutting down, waiting for tide controller");
    tide_process.wait()?;
    bv_ipc::queue::destroy(&match_in_path);
    drop(tide);

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
