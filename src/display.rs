use std::io::Write;
use std::net::IpAddr;

use colored::{ColoredString, Colorize};

use crate::counters::CounterSnapshot;
use crate::probe::{ProbeOutcome, ProbeResult, PAYLOAD_SIZE};

/// How a console line should be styled.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Severity {
    Success,
    Neutral,
    Error,
    Info,
}

/// Sink for everything the probe run shows to the operator.
pub trait Console: Send + Sync {
    /// Writes one line of regular output.
    fn print_line(&self, severity: Severity, line: &str);

    /// Writes one line of diagnostic output.
    fn print_error(&self, line: &str);

    /// Writes a diagnostic about the invocation itself, followed by the usage text.
    fn print_usage_error(&self, line: &str, usage: &str);
}

/// Console writing to the process's standard streams, colored by severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn print_line(&self, severity: Severity, line: &str) {
        let styled = match severity {
            Severity::Success => line.green(),
            Severity::Neutral => line.normal(),
            Severity::Error => line.red(),
            Severity::Info => line.cyan(),
        };
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort the run.
        let _ = writeln!(stdout, "{}", styled);
        let _ = stdout.flush();
    }

    fn print_error(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", styled_error(line, false));
    }

    fn print_usage_error(&self, line: &str, usage: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", styled_error(line, true));
        let _ = writeln!(stderr, "{}", usage);
    }
}

/// Usage errors stand out in bright red, everything else is plain red.
fn styled_error(line: &str, usage: bool) -> ColoredString {
    let line = format!("ERROR: {}", line);
    if usage {
        line.bright_red()
    } else {
        line.red()
    }
}

pub fn render_banner(name: &str, address: IpAddr) -> String {
    format!(
        "Pinging {} [{}] with {} bytes of data:",
        name, address, PAYLOAD_SIZE
    )
}

pub fn render_result(result: &ProbeResult) -> (Severity, String) {
    match result.outcome() {
        ProbeOutcome::Reply { elapsed_millis } => (
            Severity::Success,
            format!(
                "Reply from {}: bytes={} time={}ms",
                result.target(),
                result.payload_size(),
                elapsed_millis
            ),
        ),
        ProbeOutcome::TimedOut => (Severity::Error, "Request timed out.".to_string()),
        ProbeOutcome::NetworkError(err) => (Severity::Error, format!("Network Error: {}", err)),
    }
}

pub fn render_summary(snapshot: &CounterSnapshot) -> String {
    format!(
        "{} of {} attempts were successful",
        snapshot.successes,
        snapshot.total()
    )
}
