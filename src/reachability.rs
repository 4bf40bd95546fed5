use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use tokio::net::TcpSocket;

use crate::error::TransportError;
use crate::probe::{ProbeInput, PAYLOAD_SIZE};

/// Port probed by the TCP fallback.
const ECHO_PORT: u16 = 7;

/// A single bounded reachability check against a resolved address.
///
/// Implementations return `Ok(true)` when the target answered within
/// `input.timeout`, `Ok(false)` when it did not, and `Err` when the check could
/// not be carried out at the transport level.
pub trait Reachability {
    fn check(
        &self,
        input: &ProbeInput,
    ) -> impl Future<Output = std::result::Result<bool, TransportError>> + Send;
}

impl From<SurgeError> for TransportError {
    fn from(err: SurgeError) -> Self {
        match err {
            SurgeError::IOError(err) => err.into(),
            other => TransportError::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

/// Reachability backed by the platform networking stack.
///
/// Sends an ICMP echo request carrying a [`PAYLOAD_SIZE`]-byte payload. When the
/// process is not allowed to open an ICMP socket, a TCP connection to the echo
/// port is attempted instead; an established or refused connection both mean
/// the host answered.
#[derive(Debug)]
pub struct PlatformReachability {
    identifier: u16,
    sequence: AtomicU16,
    fallback_logged: AtomicBool,
}

impl Default for PlatformReachability {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformReachability {
    pub fn new() -> Self {
        Self {
            identifier: std::process::id() as u16,
            sequence: AtomicU16::new(0),
            fallback_logged: AtomicBool::new(false),
        }
    }

    fn icmp_config(input: &ProbeInput) -> Config {
        let mut builder = Config::builder().ttl(u32::from(input.ttl));
        if input.target.is_ipv6() {
            builder = builder.kind(ICMP::V6);
        }
        if let Some(source) = &input.source {
            builder = builder.bind(SocketAddr::new(source.address, 0));
        }
        builder.build()
    }

    async fn echo(
        &self,
        client: Client,
        input: &ProbeInput,
    ) -> std::result::Result<bool, TransportError> {
        let mut pinger = client
            .pinger(input.target, PingIdentifier(self.identifier))
            .await;
        pinger.timeout(input.timeout);
        let sequence = PingSequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        match pinger.ping(sequence, &[0; PAYLOAD_SIZE]).await {
            Ok(_) => Ok(true),
            Err(SurgeError::Timeout { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn tcp_echo(input: &ProbeInput) -> std::result::Result<bool, TransportError> {
        let socket = match input.target {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(source) = &input.source {
            socket.bind(SocketAddr::new(source.address, 0))?;
        }
        let connect = socket.connect(SocketAddr::new(input.target, ECHO_PORT));
        match tokio::time::timeout(input.timeout, connect).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(err)) if err.kind() == io::ErrorKind::ConnectionRefused => Ok(true),
            Ok(Err(err)) if err.kind() == io::ErrorKind::TimedOut => Ok(false),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Ok(false),
        }
    }
}

impl Reachability for PlatformReachability {
    async fn check(&self, input: &ProbeInput) -> std::result::Result<bool, TransportError> {
        match Client::new(&Self::icmp_config(input)) {
            Ok(client) => self.echo(client, input).await,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                if !self.fallback_logged.swap(true, Ordering::Relaxed) {
                    log::warn!(
                        "ICMP socket not permitted ({}), probing TCP port {} instead",
                        err,
                        ECHO_PORT
                    );
                }
                Self::tcp_echo(input).await
            }
            Err(err) => Err(err.into()),
        }
    }
}
