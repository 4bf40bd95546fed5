use std::future::Future;
use std::sync::Arc;

use clap::CommandFactory;

use crate::cli::Args;
use crate::counters::CounterSnapshot;
use crate::display::{render_banner, Console, Severity};
use crate::error::{Error, Result};
use crate::probe::ProbeInputBuilder;
use crate::reachability::Reachability;
use crate::resolve::{resolve_host, resolve_source_interface};
use crate::runner::{ProbeLoop, RunConfigBuilder};

/// Exit status for usage errors and unresolvable hosts.
pub const FAILURE_EXIT_CODE: u8 = 255;

/// Resolves the requested host and source, then probes until the attempts are
/// used up or `interrupt` resolves.
///
/// Resolution failures are returned before anything is printed; once probing
/// has started the run always ends with the summary line.
pub async fn execute<R, F>(
    args: &Args,
    reachability: R,
    console: Arc<dyn Console>,
    interrupt: F,
) -> Result<CounterSnapshot>
where
    R: Reachability,
    F: Future + Send + 'static,
{
    let source = match &args.source {
        Some(address) => Some(resolve_source_interface(address).await?),
        None => None,
    };
    if let Some(source) = &source {
        log::debug!("sending from {} ({})", source.name, source.address);
    }
    let host = resolve_host(&args.host).await?;
    let input = ProbeInputBuilder::new()
        .with_target(host.address)
        .with_source(source)
        .with_ttl(args.ttl)
        .with_timeout(args.timeout())
        .build()?;
    let config = RunConfigBuilder::new(input)
        .with_attempts(args.attempts())
        .build();

    console.print_line(Severity::Neutral, &render_banner(&host.name, host.address));

    let probe_loop = ProbeLoop::new(reachability, console);
    let handler = probe_loop.spawn_interrupt_handler(interrupt);
    let snapshot = probe_loop.run(&config).await;
    handler.join().await;
    Ok(snapshot)
}

/// Reports a failed run on `console` and returns the process exit status.
///
/// A source address that no local interface owns is an invocation mistake and
/// is followed by the usage line.
pub fn report_failure(err: &Error, console: &dyn Console) -> u8 {
    match err {
        Error::UnknownInterface(_) => {
            let usage = Args::command().render_usage().to_string();
            console.print_usage_error(&err.to_string(), &usage);
        }
        _ => console.print_error(&err.to_string()),
    }
    FAILURE_EXIT_CODE
}
