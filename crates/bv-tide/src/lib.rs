//! The tide scheduler: one barrier per court row, periodically raised or
//! lowered so that an expanding or shrinking band of rows is blocked.

use std::path::Path;
use std::time::Duration;

use bv_core::discriminator::TIDE_ROW_BASE;
use bv_core::CourtIndex;
use bv_ipc::error::IpcError;
use bv_ipc::key::Key;
use bv_ipc::signal::quit_requested;
use bv_ipc::Barrier;
use rand::Rng;

const TIDE_PERIOD_SECS: u64 = bv_core::TIDE_PERIOD_SECS;

fn row_key(key_path: &Path, row: CourtIndex) -> Key {
    Key::new(key_path, TIDE_ROW_BASE + row as u8)
}

/// `rows` gates, one per court row, plus the current tide index: rows with
/// index `< tide` are closed.
pub struct TideScheduler {
    barriers: Vec<Barrier>,
    tide: CourtIndex,
}

impl TideScheduler {
    /// Creates one barrier per row, each open (value 0). The caller becomes
    /// their creator.
    pub fn create(key_path: &Path, rows: CourtIndex) -> Result<Self, IpcError> {
        let barriers = (0..rows)
            .map(|row| Barrier::create_and_open(&row_key(key_path, row), 0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { barriers, tide: 0 })
    }

    /// Attaches to barriers already created by another process. Every row
    /// is created open (value 0), so that's the value passed through for
    /// [`Barrier::reset`].
    pub fn attach(key_path: &Path, rows: CourtIndex) -> Result<Self, IpcError> {
        let barriers = (0..rows)
            .map(|row| Barrier::attach_existing(&row_key(key_path, row), 0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { barriers, tide: 0 })
    }

    pub fn rows(&self) -> CourtIndex {
        self.barriers.len()
    }

    /// The barrier a court worker in `row` must wait on before each match.
    pub fn row(&self, row: CourtIndex) -> &Barrier {
        &self.barriers[row]
    }

    pub fn tide(&self) -> CourtIndex {
        self.tide
    }

    /// Raises or lowers the tide by one row with a fair coin. `tide` itself
    /// is a count of closed rows, `0..=rows`, not a row index — reaching
    /// `rows` is what closes the last row (index `rows - 1`), so the count
    /// necessarily runs one past the highest row index. Does not sleep;
    /// [`run`](Self::run) is the sleeping loop driving this in production.
    pub fn tick(&mut self, rng: &mut impl Rng) -> Result<(), IpcError> {
        if rng.random_bool(0.5) {
            if self.tide < self.rows() {
                self.barriers[self.tide].close()?;
                self.tide += 1;
            }
        } else if self.tide > 0 {
            self.tide -= 1;
            self.barriers[self.tide].open()?;
        }
        Ok(())
    }

    /// Sleeps for the tide period, then [`tick`](Self::tick)s, until a
    /// shutdown signal is observed. Restarts the sleep immediately if
    /// shutdown arrives mid-sleep, without ticking.
    pub fn run(&mut self, rng: &mut impl Rng) -> Result<(), IpcError> {
        while !quit_requested() {
            std::thread::sleep(Duration::from_secs(TIDE_PERIOD_SECS));
            if quit_requested() {
                break;
            }
            self.tick(rng)?;
        }
        Ok(())
    }
}
