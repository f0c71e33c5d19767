use crate::tls::{CipherSuiteCatalog, HandshakeSummary};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_millis(15000);
pub const DEFAULT_MAX_HANDSHAKE_RECORDS: usize = 64;
/// 16381 bytes: a full 16 KiB record once type, length and padding are added.
pub const DEFAULT_DECLARED_LENGTH: u16 = 0x3FFD;
pub const DEFAULT_PAYLOAD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Target {
    pub original: TargetSpec,
    pub resolved: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSpec,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub overall_timeout: Duration,
    pub max_handshake_records: usize,
    pub heartbeat: HeartbeatConfig,
    pub cipher_suites: CipherSuiteCatalog,
    pub output: OutputConfig,
}

impl Config {
    pub fn for_target(target: TargetSpec) -> Self {
        Self {
            target,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
            max_handshake_records: DEFAULT_MAX_HANDSHAKE_RECORDS,
            heartbeat: HeartbeatConfig::default(),
            cipher_suites: CipherSuiteCatalog::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub declared_length: u16,
    pub payload: Vec<u8>,
}

impl HeartbeatConfig {
    /// Random payload of `payload_size` bytes; its content is irrelevant.
    pub fn with_payload_size(declared_length: u16, payload_size: usize) -> Self {
        let mut payload = vec![0u8; payload_size];
        rand::thread_rng().fill(&mut payload[..]);
        Self {
            declared_length,
            payload,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::with_payload_size(DEFAULT_DECLARED_LENGTH, DEFAULT_PAYLOAD_SIZE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub dump: bool,
    /// Cap on dumped leak bytes, `None` for the whole leak.
    pub max_dump_bytes: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            dump: true,
            max_dump_bytes: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Controller states, also used to say where an indeterminate probe stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStage {
    Connecting,
    Handshaking,
    Heartbeating,
    Classifying,
    Closed,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProbeStage::Connecting => "connecting",
            ProbeStage::Handshaking => "handshaking",
            ProbeStage::Heartbeating => "heartbeating",
            ProbeStage::Classifying => "classifying",
            ProbeStage::Closed => "closed",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeObservation {
    /// The peer answered the heartbeat with another content type.
    NotHeartbeat { content_type: u8 },
    /// The peer echoed no more than the payload it was sent.
    EchoWithinBounds { echoed: usize },
}

impl fmt::Display for SafeObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeObservation::NotHeartbeat { content_type } => {
                write!(f, "no heartbeat response (content type {content_type})")
            }
            SafeObservation::EchoWithinBounds { echoed } => {
                write!(f, "heartbeat echoed {echoed} bytes")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Vulnerable { leaked: Vec<u8> },
    Safe(SafeObservation),
    Indeterminate { stage: ProbeStage, reason: String },
}

impl ProbeOutcome {
    pub fn status_text(&self) -> &'static str {
        match self {
            ProbeOutcome::Vulnerable { .. } => "vulnerable",
            ProbeOutcome::Safe(_) => "safe",
            ProbeOutcome::Indeterminate { .. } => "indeterminate",
        }
    }

    pub fn leaked_len(&self) -> Option<usize> {
        match self {
            ProbeOutcome::Vulnerable { leaked } => Some(leaked.len()),
            _ => None,
        }
    }

    /// Vulnerable and safe are both completed probes.
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, ProbeOutcome::Indeterminate { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetView {
    pub host: String,
    pub addr: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub target: TargetView,
    pub timestamp: String,
    pub connect_ms: Option<u128>,
    pub handshake: Option<HandshakeSummary>,
    pub outcome: ProbeOutcome,
}

impl Target {
    pub fn view(&self) -> TargetView {
        TargetView {
            host: self.original.host.clone(),
            addr: self.resolved.ip().to_string(),
            port: self.resolved.port(),
        }
    }
}
