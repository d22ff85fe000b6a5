//! Court worker pool binary.
//!
//! Forks one process per court in a `rows x cols` grid, each attaching to
//! its row's tide barrier and to the shared match streams, then waits for
//! all of them to exit.

use std::path::PathBuf;

use bv_ipc::error::{exit_code, IpcError};
use bv_ipc::process::Process;
use bv_ipc::queue::QueueMode;
use bv_ipc::signal;
use bv_tide::TideScheduler;

#[derive(Parser, Debug)]
#[command(author, version, about = "Beach-volley court worker pool", long_about = None)]
struct Args {
    /// Number of court rows.
    #[arg(long)]
    rows: usize,
    /// Number of court columns.
    #[arg(long)]
    cols: usize,
    /// Path of the match stream workers read from.
    #[arg(long, default_value = bv_core::DEFAULT_MATCH_IN)]
    r#in: String,
    /// Path of the result stream workers write to.
    #[arg(long, default_value = bv_core::DEFAULT_MATCH_OUT)]
    out: String,
    /// Repeatable: one copy raises terminal logging to debug, two to trace.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
    /// Backing file for the `ftok`-derived shared memory and semaphore keys.
    #[arg(long, default_value = bv_core::DEFAULT_KEY_PATH)]
    key_path: String,
}

fn run_worker(row: usize, key_path: PathBuf, rows: usize, in_path: PathBuf, out_path: PathBuf) -> Result<(), IpcError> {
    let tide = TideScheduler::attach(&key_path, rows)?;
    // Court workers retry on signal interruption: a tide tick or shutdown
    // signal arriving mid-transfer shouldn't fail an otherwise healthy
    // record (§4.7/§5).
    let mut matches_in = bv_pipeline::MatchQueue::open(&in_path, QueueMode::Read, true)?;
    let mut results_out = bv_pipeline::ResultQueue::open(&out_path, QueueMode::Write, true)?;
    let mut rng = rand::rng();

    bv_sim::court::run(tide.row(row), &mut matches_in, &mut results_out, &mut rng)
}

fn run(args: Args) -> Result<(), IpcError> {
    signal::install_handlers()?;

    let key_path = PathBuf::from(&args.key_path);
    let in_path = PathBuf::from(&args.r#in);
    let out_path = PathBuf::from(&args.out);

    log::info!("starting {}x{} court grid", args.rows, args.cols);

    let mut workers = Vec::with_capacity(args.rows * args.cols);
    for row in 0..args.rows {
        for _col in 0..args.cols {
            let key_path = key_path.clone();
            let in_path = in_path.clone();
            let out_path = out_path.clone();
            let rows = args.rows;
            workers.push(Process::spawn(move || run_worker(row, key_path, rows, in_path, out_path))?);
        }
    }

    for mut worker in workers {
        worker.wait()?;
    }
    Ok(())
}

fn main() {
    let args: Args = bv_core::parse_args_or_exit();
    bv_core::init_logging_with_verbosity(args.verbose);

    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(IpcError::ChildExit) => std::process::exit(0),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(exit_code(&e));
        }
    }
}
