use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::display::{Console, Severity};
use crate::error::TransportError;
use crate::probe::ProbeInput;
use crate::reachability::Reachability;

/// One scripted answer: how long the check takes and what it reports.
#[derive(Clone, Debug)]
pub(crate) struct Scripted {
    delay: Duration,
    outcome: Result<bool, TransportError>,
}

impl Scripted {
    pub(crate) fn reachable(delay_millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_millis),
            outcome: Ok(true),
        }
    }

    pub(crate) fn unreachable(delay_millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_millis),
            outcome: Ok(false),
        }
    }

    pub(crate) fn error(delay_millis: u64, err: TransportError) -> Self {
        Self {
            delay: Duration::from_millis(delay_millis),
            outcome: Err(err),
        }
    }
}

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Reachability that replays a script, repeating its last entry once exhausted.
pub(crate) struct ScriptedReachability {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    calls: AtomicUsize,
    after_call: Option<CallHook>,
}

impl ScriptedReachability {
    pub(crate) fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            after_call: None,
        }
    }

    /// Runs `hook` with the 1-based call number after each check completes.
    pub(crate) fn with_after_call(
        mut self,
        hook: impl Fn(usize) + Send + Sync + 'static,
    ) -> Self {
        self.after_call = Some(Box::new(hook));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Scripted {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone().unwrap_or_else(|| Scripted::unreachable(0))
    }
}

impl Reachability for ScriptedReachability {
    async fn check(&self, _input: &ProbeInput) -> Result<bool, TransportError> {
        let scripted = self.next();
        tokio::time::sleep(scripted.delay).await;
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.after_call {
            hook(call);
        }
        scripted.outcome
    }
}

/// Console that keeps every line it is given.
#[derive(Debug, Default)]
pub(crate) struct RecordingConsole {
    lines: Mutex<Vec<(Severity, String)>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, line)| line).collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn count_matching(&self, needle: &str) -> usize {
        self.texts()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl Console for RecordingConsole {
    fn print_line(&self, severity: Severity, line: &str) {
        self.lines.lock().unwrap().push((severity, line.to_string()));
    }

    fn print_error(&self, line: &str) {
        self.errors.lock().unwrap().push(line.to_string());
    }

    fn print_usage_error(&self, line: &str, usage: &str) {
        let mut errors = self.errors.lock().unwrap();
        errors.push(line.to_string());
        errors.push(usage.to_string());
    }
}
