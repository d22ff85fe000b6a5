//! Shared constants, type aliases and logging setup for every executable in
//! the tournament simulator.

/// A one-based player identifier, as stored in the shared players table.
pub type PlayerId = u32;
/// The number of sets a team took in a match, `0..=3`.
pub type Sets = i32;
/// A row or column index into the court grid.
pub type CourtIndex = usize;

/// Default filesystem path for the producer → court-worker match stream.
pub const DEFAULT_MATCH_IN: &str = "/tmp/match_in";
/// Default filesystem path for the court-worker → aggregator result stream.
pub const DEFAULT_MATCH_OUT: &str = "/tmp/match_out";
/// Default filesystem path for the aggregator → scoreboard stream.
pub const DEFAULT_REDIRECT: &str = "/tmp/redirect";
/// Default backing file for `ftok`-derived shared memory and semaphore keys.
pub const DEFAULT_KEY_PATH: &str = "/tmp/beachvolley.key";

/// Discriminators distinguishing the kernel objects sharing [`DEFAULT_KEY_PATH`].
pub mod discriminator {
    /// The players table shared memory segment.
    pub const PLAYERS_TABLE: u8 = 1;
    /// The players table's lock file descriptor.
    pub const PLAYERS_LOCK: u8 = 2;
    /// Base discriminator for tide-row barriers; row `r` uses `TIDE_ROW_BASE + r`.
    pub const TIDE_ROW_BASE: u8 = 10;
}

/// Lower bound, in seconds, of a simulated match's duration.
pub const MATCH_DURATION_MIN_SECS: u64 = 3;
/// Upper bound, in seconds, of a simulated match's duration.
pub const MATCH_DURATION_MAX_SECS: u64 = 6;
/// How long the producer backs off after failing to find a pair.
pub const NO_PAIR_BACKOFF_SECS: u64 = 1;
/// How long the tide scheduler sleeps between direction changes.
pub const TIDE_PERIOD_SECS: u64 = 4;

/// Initializes dual logging: INFO to the terminal, DEBUG to a timestamped
/// file under `logs/`. Call once, before any other IPC setup, so that
/// startup failures are captured too.
pub fn init_logging() {
    std::fs::create_dir_all("logs").expect("create logs directory");

    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();

    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{timestamp}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Raises the terminal logger's level. Each repeat of `-v` on `match`'s CLI
/// calls this once before [`init_logging`]; `0` leaves the default (info),
/// `1` raises it to debug, `2` or more to trace.
pub fn verbosity_to_level_filter(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Initializes dual logging with an explicit terminal verbosity, for
/// binaries that expose a repeatable `-v` flag.
pub fn init_logging_with_verbosity(verbosity: u8) {
    std::fs::create_dir_all("logs").expect("create logs directory");

    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();

    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{timestamp}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        verbosity_to_level_filter(verbosity),
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Parses this process's CLI arguments, exiting with code 1 on a parse
/// failure rather than clap's own default of 2 — the `ArgError` contract
/// from §6/§7 needs arg errors distinguishable from a shared-memory/queue
/// error. `--help`/`--version` still print and exit 0, matching clap's
/// usual behavior.
pub fn parse_args_or_exit<T: clap::Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(arg_error_exit_code(e.kind()));
        }
    }
}

/// `--help`/`--version` exit 0, matching clap's usual behavior; every other
/// parse failure exits 1, the `ArgError` contract from §6/§7.
fn arg_error_exit_code(kind: clap::error::ErrorKind) -> i32 {
    match kind {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_escalates_monotonically() {
        assert_eq!(verbosity_to_level_filter(0), log::LevelFilter::Info);
        assert_eq!(verbosity_to_level_filter(1), log::LevelFilter::Debug);
        assert_eq!(verbosity_to_level_filter(2), log::LevelFilter::Trace);
        assert_eq!(verbosity_to_level_filter(9), log::LevelFilter::Trace);
    }

    #[test]
    fn tide_row_discriminators_do_not_collide_with_fixed_ones() {
        assert!(discriminator::TIDE_ROW_BASE > discriminator::PLAYERS_LOCK);
    }

    #[test]
    fn arg_errors_exit_one_help_and_version_exit_zero() {
        assert_eq!(arg_error_exit_code(clap::error::ErrorKind::DisplayHelp), 0);
        assert_eq!(arg_error_exit_code(clap::error::ErrorKind::DisplayVersion), 0);
        assert_eq!(arg_error_exit_code(clap::error::ErrorKind::MissingRequiredArgument), 1);
        assert_eq!(arg_error_exit_code(clap::error::ErrorKind::ValueValidation), 1);
    }
}
