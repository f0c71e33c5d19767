use std::io;
use std::time::Duration;

/// Failures of the byte-stream transport underneath a probe.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not resolve {host}")]
    Resolve { host: String },
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("connection closed by peer")]
    Closed,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }
}

/// Outbound messages that cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("cipher-suite catalog is empty")]
    EmptyCatalog,
    #[error("cipher-suite catalog holds {0} suites, at most 32767 fit in a ClientHello")]
    CatalogTooLarge(usize),
    #[error("record payload of {0} bytes exceeds 65535")]
    RecordTooLarge(usize),
    #[error("invalid cipher suite on line {line}: {text}")]
    InvalidCatalogEntry { line: usize, text: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        ProbeError::Transport(err.into())
    }
}

impl ProbeError {
    /// True when the target was never reached, as opposed to a target that
    /// answered in an unexpected way.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ProbeError::Transport(TransportError::Resolve { .. })
                | ProbeError::Transport(TransportError::Connect { .. })
        )
    }

    /// True when the probe could not even be built from its configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProbeError::Encoding(_))
    }

    /// Process exit status for a probe that produced no report.
    pub fn exit_code(&self) -> u8 {
        if self.is_unreachable() || self.is_configuration() {
            2
        } else {
            1
        }
    }
}
