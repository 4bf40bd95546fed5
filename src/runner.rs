use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::counters::{CounterSnapshot, RunCounters};
use crate::display::{render_result, Console};
use crate::invoker::invoke;
use crate::probe::ProbeInput;
use crate::reachability::Reachability;

/// Pause between two consecutive attempts.
pub const INTER_ATTEMPT_DELAY: Duration = Duration::from_millis(333);
pub const DEFAULT_ATTEMPTS: AttemptCount = AttemptCount::Finite(5);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AttemptCount {
    Finite(u64),
    Unbounded,
}

impl AttemptCount {
    /// Whether another attempt may start after `completed` attempts.
    pub fn allows(&self, completed: u64) -> bool {
        match self {
            AttemptCount::Finite(limit) => completed < *limit,
            AttemptCount::Unbounded => true,
        }
    }
}

impl Default for AttemptCount {
    fn default() -> Self {
        DEFAULT_ATTEMPTS
    }
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: ProbeInput,
    pub attempts: AttemptCount,
    pub delay: Duration,
}

#[derive(Clone, Debug)]
pub struct RunConfigBuilder {
    input: ProbeInput,
    attempts: Option<AttemptCount>,
    delay: Option<Duration>,
}

impl RunConfigBuilder {
    pub fn new(input: ProbeInput) -> Self {
        Self {
            input,
            attempts: Some(DEFAULT_ATTEMPTS),
            delay: Some(INTER_ATTEMPT_DELAY),
        }
    }

    pub fn with_attempts(mut self, attempts: AttemptCount) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> RunConfig {
        RunConfig {
            input: self.input,
            attempts: self.attempts.unwrap_or_default(),
            delay: self.delay.unwrap_or(INTER_ATTEMPT_DELAY),
        }
    }
}

/// Drives sequential attempts against one target and reports the summary once.
///
/// The loop and an optional interrupt handler share only the run counters and
/// two cancellation tokens: `cancel` asks the loop to stop, `finished` tells the
/// handler the loop has stopped. Either side may end up printing the summary;
/// [`RunCounters::print_summary_once`] makes sure exactly one does.
///
/// # Example
/// ```no_run
/// use std::net::{IpAddr, Ipv4Addr};
/// use std::sync::Arc;
/// use reachping::{
///     AttemptCount, PlatformReachability, ProbeInputBuilder, ProbeLoop, RunConfigBuilder,
///     TerminalConsole,
/// };
///
/// let input = ProbeInputBuilder::new()
///     .with_target(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)))
///     .build()
///     .expect("Failed to build probe input");
/// let config = RunConfigBuilder::new(input)
///     .with_attempts(AttemptCount::Finite(3))
///     .build();
/// tokio_test::block_on(async {
///     let probe_loop = ProbeLoop::new(PlatformReachability::new(), Arc::new(TerminalConsole));
///     let snapshot = probe_loop.run(&config).await;
///     println!("{} of {} replied", snapshot.successes, snapshot.total());
/// })
/// ```
pub struct ProbeLoop<R> {
    reachability: R,
    console: Arc<dyn Console>,
    counters: Arc<RunCounters>,
    cancel: CancellationToken,
    finished: CancellationToken,
}

impl<R: Reachability> ProbeLoop<R> {
    pub fn new(reachability: R, console: Arc<dyn Console>) -> Self {
        Self {
            reachability,
            console,
            counters: Arc::new(RunCounters::new()),
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
        }
    }

    /// Stops the loop with an externally owned token instead of a private one.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn counters(&self) -> Arc<RunCounters> {
        Arc::clone(&self.counters)
    }

    /// Token that stops the loop at the next attempt boundary once cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns a task that stops the loop and prints the summary once `trigger` resolves.
    ///
    /// After stopping the loop the handler waits for the in-flight attempt to be
    /// counted; every attempt is bounded by the invoker's deadline. If the loop
    /// finishes before `trigger` fires, the handler exits without doing anything.
    pub fn spawn_interrupt_handler<F>(&self, trigger: F) -> InterruptHandler
    where
        F: Future + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let finished = self.finished.clone();
        let counters = Arc::clone(&self.counters);
        let console = Arc::clone(&self.console);

        let handle = tokio::task::spawn(async move {
            tokio::select! {
                _ = finished.cancelled() => return,
                _ = trigger => {}
            }
            log::debug!("interrupt received, stopping probe loop");
            cancel.cancel();
            finished.cancelled().await;
            counters.print_summary_once(&*console).await;
        });

        InterruptHandler {
            finished: self.finished.clone(),
            handle: Some(handle),
        }
    }

    /// Runs the configured attempts, then prints the summary unless an interrupt
    /// handler already has.
    ///
    /// A probe loop runs once; its counters cover a single run.
    pub async fn run(&self, config: &RunConfig) -> CounterSnapshot {
        let mut completed = 0u64;
        while config.attempts.allows(completed) && !self.cancel.is_cancelled() {
            let result = invoke(&self.reachability, &config.input).await;
            let (severity, line) = render_result(&result);
            self.console.print_line(severity, &line);
            self.counters.record(&result).await;
            completed += 1;
            self.pause(config.delay).await;
        }
        log::debug!("probe loop finished after {} attempts", completed);

        self.finished.cancel();
        self.counters.print_summary_once(&*self.console).await;
        self.counters.snapshot().await
    }

    /// Waits for `delay`, returning early if the loop is cancelled meanwhile.
    async fn pause(&self, delay: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {},
            _ = self.cancel.cancelled() => {
                log::debug!("inter-attempt wait interrupted");
            }
        }
    }
}

/// Handle to the task spawned by [`ProbeLoop::spawn_interrupt_handler`].
#[derive(Debug)]
pub struct InterruptHandler {
    finished: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl InterruptHandler {
    /// Waits for the handler to wind down once the loop has finished.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log::warn!("interrupt handler failed: {}", err);
            }
        }
    }
}

impl Drop for InterruptHandler {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.finished.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex;

    use tokio::sync::oneshot;
    use tokio::time::Instant;

    use super::*;
    use crate::display::Severity;
    use crate::probe::ProbeInputBuilder;
    use crate::testing::{RecordingConsole, Scripted, ScriptedReachability};

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));

    fn config(attempts: AttemptCount) -> RunConfig {
        let input = ProbeInputBuilder::new()
            .with_target(TARGET)
            .with_timeout(Duration::from_millis(1000))
            .build()
            .unwrap();
        RunConfigBuilder::new(input).with_attempts(attempts).build()
    }

    #[test]
    fn test_attempt_count_allows() {
        assert!(AttemptCount::Finite(2).allows(1));
        assert!(!AttemptCount::Finite(2).allows(2));
        assert!(AttemptCount::Unbounded.allows(u64::MAX));
        assert_eq!(AttemptCount::default(), AttemptCount::Finite(5));
    }

    #[test]
    fn test_config_builder_defaults() {
        let input = ProbeInputBuilder::new().with_target(TARGET).build().unwrap();
        let config = RunConfigBuilder::new(input).build();
        assert_eq!(config.attempts, AttemptCount::Finite(5));
        assert_eq!(config.delay, INTER_ATTEMPT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_reachable() {
        let console = Arc::new(RecordingConsole::new());
        let reachability = ScriptedReachability::new([Scripted::reachable(10)]);
        let probe_loop = ProbeLoop::new(reachability, console.clone());

        let snapshot = probe_loop.run(&config(AttemptCount::Finite(3))).await;

        assert_eq!(snapshot.successes, 3);
        assert_eq!(snapshot.total(), 3);
        assert!(snapshot.summary_printed);
        let reply = "Reply from 192.0.2.10: bytes=32 time=10ms".to_string();
        assert_eq!(
            console.lines(),
            vec![
                (Severity::Success, reply.clone()),
                (Severity::Success, reply.clone()),
                (Severity::Success, reply),
                (Severity::Info, "3 of 3 attempts were successful".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_reply() {
        let console = Arc::new(RecordingConsole::new());
        let reachability =
            ScriptedReachability::new([Scripted::unreachable(400), Scripted::reachable(20)]);
        let probe_loop = ProbeLoop::new(reachability, console.clone());

        let snapshot = probe_loop.run(&config(AttemptCount::Finite(2))).await;

        assert_eq!((snapshot.successes, snapshot.failures), (1, 1));
        assert_eq!(
            console.texts(),
            vec![
                "Request timed out.".to_string(),
                "Reply from 192.0.2.10: bytes=32 time=20ms".to_string(),
                "1 of 2 attempts were successful".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_paced() {
        let console = Arc::new(RecordingConsole::new());
        let reachability = ScriptedReachability::new([Scripted::reachable(10)]);
        let probe_loop = ProbeLoop::new(reachability, console);

        let start = Instant::now();
        probe_loop.run(&config(AttemptCount::Finite(3))).await;

        assert_eq!(start.elapsed(), Duration::from_millis(3 * (10 + 333)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_cuts_the_wait_short() {
        let console = Arc::new(RecordingConsole::new());
        let token = CancellationToken::new();
        let reachability = ScriptedReachability::new([Scripted::reachable(10)]).with_after_call({
            let token = token.clone();
            move |_| token.cancel()
        });
        let probe_loop =
            ProbeLoop::new(reachability, console.clone()).with_cancellation_token(token);

        let start = Instant::now();
        let snapshot = probe_loop.run(&config(AttemptCount::Finite(3))).await;

        assert_eq!(snapshot.total(), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(10));
        assert_eq!(console.count_matching("attempts were successful"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_run_stops_on_interrupt() {
        let console = Arc::new(RecordingConsole::new());
        let (tx, rx) = oneshot::channel::<()>();
        let tx = Mutex::new(Some(tx));
        let reachability = ScriptedReachability::new([Scripted::reachable(15)])
            .with_after_call(move |call| {
                if call == 5 {
                    if let Some(tx) = tx.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                }
            });
        let probe_loop = ProbeLoop::new(reachability, console.clone());
        let config = config(AttemptCount::Unbounded);

        let handler = probe_loop.spawn_interrupt_handler(rx);
        let snapshot = probe_loop.run(&config).await;
        handler.join().await;

        assert_eq!(snapshot.total(), 5);
        assert_eq!(probe_loop.reachability.calls(), 5);
        assert_eq!(console.count_matching("Reply from"), 5);
        assert_eq!(
            console.lines().last(),
            Some(&(Severity::Info, "5 of 5 attempts were successful".to_string()))
        );
        assert_eq!(console.count_matching("attempts were successful"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_slow_attempt_counts_it() {
        let console = Arc::new(RecordingConsole::new());
        let reachability = ScriptedReachability::new([Scripted::reachable(800)]);
        let probe_loop = ProbeLoop::new(reachability, console.clone());
        let config = config(AttemptCount::Unbounded);

        // Arrives while the second attempt is in flight.
        let handler =
            probe_loop.spawn_interrupt_handler(tokio::time::sleep(Duration::from_millis(1333)));
        let snapshot = probe_loop.run(&config).await;
        handler.join().await;

        let reply = "Reply from 192.0.2.10: bytes=32 time=800ms".to_string();
        assert_eq!(snapshot.total(), 2);
        assert_eq!(snapshot.successes, 2);
        assert_eq!(
            console.texts(),
            vec![
                reply.clone(),
                reply,
                "2 of 2 attempts were successful".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_first_attempt_reports_it() {
        let console = Arc::new(RecordingConsole::new());
        let reachability = ScriptedReachability::new([Scripted::reachable(800)]);
        let probe_loop = ProbeLoop::new(reachability, console.clone());
        let config = config(AttemptCount::Unbounded);

        let handler =
            probe_loop.spawn_interrupt_handler(tokio::time::sleep(Duration::from_millis(200)));
        let snapshot = probe_loop.run(&config).await;
        handler.join().await;

        assert_eq!(snapshot.total(), 1);
        assert_eq!(
            console.texts(),
            vec![
                "Reply from 192.0.2.10: bytes=32 time=800ms".to_string(),
                "1 of 1 attempts were successful".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_stays_quiet_after_normal_completion() {
        let console = Arc::new(RecordingConsole::new());
        let reachability = ScriptedReachability::new([Scripted::reachable(5)]);
        let probe_loop = ProbeLoop::new(reachability, console.clone());
        let config = config(AttemptCount::Finite(2));

        let handler = probe_loop.spawn_interrupt_handler(std::future::pending::<()>());
        probe_loop.run(&config).await;
        handler.join().await;

        assert!(!probe_loop.cancellation_token().is_cancelled());
        assert_eq!(console.count_matching("attempts were successful"), 1);
        assert_eq!(probe_loop.counters().snapshot().await.total(), 2);
    }
}
