use std::time::Duration;

use clap::Parser;

use crate::probe::DEFAULT_TTL;
use crate::runner::AttemptCount;

/// Probe a host for reachability and report how many attempts succeeded
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "reachping", version, about, long_about = None)]
pub struct Args {
    /// Host name or address to probe
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Time to live of outgoing probes
    #[arg(
        short = 'i',
        value_name = "TTL",
        default_value_t = DEFAULT_TTL,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub ttl: u8,

    /// Number of attempts
    #[arg(
        short = 'n',
        value_name = "NUMBER",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        overrides_with = "forever"
    )]
    pub count: u64,

    /// Probe the host until stopped
    #[arg(short = 't', overrides_with = "count")]
    pub forever: bool,

    /// Timeout of each attempt, in milliseconds
    #[arg(
        short = 'w',
        value_name = "TIMEOUT",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Send probes from the interface owning this address
    #[arg(short = 'S', value_name = "ADDRESS")]
    pub source: Option<String>,
}

impl Args {
    /// Attempts requested; of `-n` and `-t` the one given last wins.
    pub fn attempts(&self) -> AttemptCount {
        if self.forever {
            AttemptCount::Unbounded
        } else {
            AttemptCount::Finite(self.count)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}
