use std::io;

use thiserror::Error as ThisError;

pub type OpaqueError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Unknown host '{0}'")]
    UnknownHost(String),
    #[error("Cannot resolve interface for address '{0}'")]
    UnknownInterface(String),
    #[error("invalid probe input: {0}")]
    Input(#[from] InputBuildError),
    #[error("{0}")]
    Opaque(#[from] OpaqueError),
}
pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputBuildError {
    #[error("target address is required")]
    MissingTarget,
    #[error("time to live must be positive")]
    ZeroTtl,
    #[error("timeout must be positive")]
    ZeroTimeout,
}

/// Failure of the transport underneath a single reachability check.
///
/// Carried inside a [`crate::probe::ProbeResult`] rather than propagated, so it is
/// cheap to clone and compares by kind and message.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    kind: io::ErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: io::ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
