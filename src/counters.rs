use tokio::sync::Mutex;

use crate::display::{render_summary, Console, Severity};
use crate::probe::ProbeResult;

/// Point-in-time copy of the run counters.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct CounterSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub summary_printed: bool,
}

impl CounterSnapshot {
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Counters shared between the probe loop and the interrupt handler.
///
/// Every field lives behind the same lock, so the summary is always computed
/// from a consistent snapshot and the printed flag is tested and set in one step.
#[derive(Debug, Default)]
pub struct RunCounters {
    state: Mutex<CounterSnapshot>,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, result: &ProbeResult) {
        let mut state = self.state.lock().await;
        if result.is_success() {
            state.successes += 1;
        } else {
            state.failures += 1;
        }
    }

    pub async fn snapshot(&self) -> CounterSnapshot {
        *self.state.lock().await
    }

    /// Prints the summary line unless it has already been printed.
    ///
    /// Returns `true` for the one caller that printed it.
    pub async fn print_summary_once(&self, console: &dyn Console) -> bool {
        let mut state = self.state.lock().await;
        if state.summary_printed {
            return false;
        }
        console.print_line(Severity::Info, &render_summary(&state));
        state.summary_printed = true;
        true
    }
}
