use std::net::IpAddr;
use std::time::Duration;

use crate::error::{InputBuildError, TransportError};

/// Size of the echo payload carried by every probe.
pub const PAYLOAD_SIZE: usize = 32;
pub const DEFAULT_TTL: u8 = 255;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Elapsed time reported when an attempt did not complete normally.
pub const ELAPSED_UNKNOWN: i64 = -1;

/// Local interface the probes leave from, identified by one of its addresses.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SourceInterface {
    pub name: String,
    pub address: IpAddr,
}

impl SourceInterface {
    pub fn new(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProbeInput {
    pub target: IpAddr,
    pub source: Option<SourceInterface>,
    pub ttl: u8,
    pub timeout: Duration,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProbeInputBuilder {
    target: Option<IpAddr>,
    source: Option<SourceInterface>,
    ttl: u8,
    timeout: Duration,
}

impl Default for ProbeInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeInputBuilder {
    pub fn new() -> Self {
        Self {
            target: None,
            source: None,
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_target(mut self, target: IpAddr) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_source(mut self, source: Option<SourceInterface>) -> Self {
        self.source = source;
        self
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(&self) -> std::result::Result<ProbeInput, InputBuildError> {
        if self.ttl == 0 {
            return Err(InputBuildError::ZeroTtl);
        }
        if self.timeout.is_zero() {
            return Err(InputBuildError::ZeroTimeout);
        }
        Ok(ProbeInput {
            target: self.target.ok_or(InputBuildError::MissingTarget)?,
            source: self.source.clone(),
            ttl: self.ttl,
            timeout: self.timeout,
        })
    }
}

/// Outcome of a single attempt.
///
/// `success` holds only when the check reported the target reachable and no
/// transport error occurred; a failed attempt that did not complete normally
/// reports [`ELAPSED_UNKNOWN`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ProbeResult {
    success: bool,
    elapsed_millis: i64,
    target: IpAddr,
    transport_error: Option<TransportError>,
}

/// Borrowed view over the three ways an attempt can end.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ProbeOutcome<'a> {
    Reply { elapsed_millis: i64 },
    TimedOut,
    NetworkError(&'a TransportError),
}

impl ProbeResult {
    pub fn new(
        reachable: bool,
        elapsed_millis: i64,
        target: IpAddr,
        transport_error: Option<TransportError>,
    ) -> Self {
        Self {
            success: reachable && transport_error.is_none() && elapsed_millis >= 0,
            elapsed_millis,
            target,
            transport_error,
        }
    }

    pub fn network_error(target: IpAddr, err: TransportError) -> Self {
        Self::new(false, ELAPSED_UNKNOWN, target, Some(err))
    }

    pub fn overrun(target: IpAddr) -> Self {
        Self::new(false, ELAPSED_UNKNOWN, target, None)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn elapsed_millis(&self) -> i64 {
        self.elapsed_millis
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        self.transport_error.as_ref()
    }

    pub fn payload_size(&self) -> usize {
        PAYLOAD_SIZE
    }

    pub fn outcome(&self) -> ProbeOutcome<'_> {
        match (&self.transport_error, self.success) {
            (Some(err), _) => ProbeOutcome::NetworkError(err),
            (None, true) => ProbeOutcome::Reply {
                elapsed_millis: self.elapsed_millis,
            },
            (None, false) => ProbeOutcome::TimedOut,
        }
    }
}
