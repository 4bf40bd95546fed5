//! ## Example
//! Probe a host three times and print one line per attempt followed by the summary.
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//! use reachping::{
//!     AttemptCount, PlatformReachability, ProbeInputBuilder, ProbeLoop, RunConfigBuilder,
//!     TerminalConsole,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let input = ProbeInputBuilder::new()
//!         .with_target(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)))
//!         .build()
//!         .unwrap();
//!     let config = RunConfigBuilder::new(input)
//!         .with_attempts(AttemptCount::Finite(3))
//!         .build();
//!
//!     let probe_loop = ProbeLoop::new(PlatformReachability::new(), Arc::new(TerminalConsole));
//!     let handler = probe_loop.spawn_interrupt_handler(async { tokio::signal::ctrl_c().await });
//!     probe_loop.run(&config).await;
//!     handler.join().await;
//! }
//! ```
//! Custom probing primitives plug in through [`reachability::Reachability`].

pub mod app;
pub mod cli;
pub mod counters;
pub mod display;
pub mod error;
pub mod invoker;
pub mod probe;
pub mod reachability;
pub mod resolve;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::Args;
pub use counters::{CounterSnapshot, RunCounters};
pub use display::{Console, Severity, TerminalConsole};
pub use error::{Error, Result, TransportError};
pub use probe::{ProbeInput, ProbeInputBuilder, ProbeResult, SourceInterface};
pub use reachability::{PlatformReachability, Reachability};
pub use runner::{AttemptCount, ProbeLoop, RunConfig, RunConfigBuilder};
