use std::time::Duration;

use tokio::time::Instant;

use crate::probe::{ProbeInput, ProbeResult};
use crate::reachability::Reachability;

/// Measured time tolerated beyond the timeout before the attempt counts as an overrun.
const OVERRUN_SLACK: Duration = Duration::from_millis(2);

/// Hard deadline added on top of the timeout in case the check ignores its own bound.
const DEADLINE_SLACK: Duration = Duration::from_millis(250);

/// Runs one reachability check against `input.target` and classifies it.
///
/// A transport failure yields a network-error result, a check that took longer
/// than the timeout (or never returned) yields a timed-out result with an
/// unknown elapsed time, and anything else reports the check's verdict with the
/// elapsed time clamped to the timeout.
pub async fn invoke<R: Reachability>(reachability: &R, input: &ProbeInput) -> ProbeResult {
    let timeout_millis = as_millis(input.timeout);
    let start = Instant::now();
    let checked =
        tokio::time::timeout(input.timeout + DEADLINE_SLACK, reachability.check(input)).await;
    let elapsed = start.elapsed();

    match checked {
        Ok(Err(err)) => {
            log::debug!("probe to {} failed: {}", input.target, err);
            ProbeResult::network_error(input.target, err)
        }
        Ok(Ok(_)) if elapsed > input.timeout + OVERRUN_SLACK => {
            log::debug!(
                "probe to {} took {:?}, beyond its {:?} bound",
                input.target,
                elapsed,
                input.timeout
            );
            ProbeResult::overrun(input.target)
        }
        Err(_) => {
            log::debug!("probe to {} missed its deadline", input.target);
            ProbeResult::overrun(input.target)
        }
        Ok(Ok(reachable)) => ProbeResult::new(
            reachable,
            as_millis(elapsed).min(timeout_millis),
            input.target,
            None,
        ),
    }
}

fn as_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
