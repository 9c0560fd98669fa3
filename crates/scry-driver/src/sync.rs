//! Queue-synchronization tuning.
//!
//! Waiting for device work first busy-spins, then falls back to a timer-based
//! wait. The thresholds are tuning constants with no stated correctness
//! rationale; they are kept configurable rather than hard-coded.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Busy-spin iterations before falling back to the timer wait.
pub const DEFAULT_SPIN_ITERATIONS: u32 = 256;
/// During the spin phase, yield the thread every this many iterations.
pub const DEFAULT_YIELD_EVERY: u32 = 8;
/// Timer poll interval once spinning has given up.
pub const DEFAULT_TIMER_INTERVAL_US: u64 = 100;

/// Spin/backoff thresholds for device synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTuning {
    pub spin_iterations: u32,
    pub yield_every: u32,
    pub timer_interval_us: u64,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            spin_iterations: DEFAULT_SPIN_ITERATIONS,
            yield_every: DEFAULT_YIELD_EVERY,
            timer_interval_us: DEFAULT_TIMER_INTERVAL_US,
        }
    }
}

impl SyncTuning {
    pub fn timer_interval(&self) -> Duration {
        Duration::from_micros(self.timer_interval_us)
    }
}

/// Wait until `ready` reports true: busy-spin per `tuning`, then poll on the
/// timer interval until `timeout` elapses.
///
/// Returns whether `ready` was observed true before the timeout.
pub fn wait_until(
    tuning: &SyncTuning,
    timeout: Duration,
    mut ready: impl FnMut() -> bool,
) -> bool {
    for i in 0..tuning.spin_iterations {
        if ready() {
            return true;
        }
        if tuning.yield_every > 0 && i % tuning.yield_every == tuning.yield_every - 1 {
            std::thread::yield_now();
        }
        std::hint::spin_loop();
    }

    let deadline = Instant::now() + timeout;
    loop {
        if ready() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(tuning.timer_interval());
    }
}
