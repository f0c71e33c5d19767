use clap::{ArgAction, Parser, ValueEnum};
use heartbleed_probe::model::{
    Config, HeartbeatConfig, OutputConfig, OutputFormat, DEFAULT_DECLARED_LENGTH,
    DEFAULT_PAYLOAD_SIZE,
};
use heartbleed_probe::tls::heartbeat::HEARTBEAT_HEADER_LEN;
use heartbleed_probe::tls::CipherSuiteCatalog;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Checks a TLS endpoint for the Heartbleed over-read (CVE-2014-0160)",
    long_about = None
)]
pub struct Cli {
    /// Target host, optionally with a port (example.com:8443, [::1]:443)
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Target port [default: 443]
    #[arg(value_name = "PORT")]
    pub port: Option<u16>,

    /// Connect timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 1500)]
    pub connect_timeout_ms: u64,

    /// Timeout for each read phase (handshake, heartbeat) in milliseconds
    #[arg(long = "read-timeout", default_value_t = 5000)]
    pub read_timeout_ms: u64,

    /// Overall timeout for the probe in milliseconds
    #[arg(long = "overall-timeout", default_value_t = 15000)]
    pub overall_timeout_ms: u64,

    /// Records to read before giving up on ServerHelloDone
    #[arg(long = "max-handshake-records", default_value_t = 64)]
    pub max_handshake_records: usize,

    /// Payload length claimed in the heartbeat request
    #[arg(long = "declared-length", default_value_t = DEFAULT_DECLARED_LENGTH)]
    pub declared_length: u16,

    /// Payload bytes actually sent in the heartbeat request
    #[arg(long = "payload-size", default_value_t = DEFAULT_PAYLOAD_SIZE)]
    pub payload_size: usize,

    /// File with the cipher suites to offer, one hex code per line
    #[arg(long = "cipher-suites", value_name = "FILE")]
    pub cipher_suites: Option<PathBuf>,

    /// Output format
    #[arg(long = "output", default_value_t = Format::Pretty)]
    pub output: Format,

    /// Largest number of leaked bytes to dump, 0 for all of them
    #[arg(long = "max-dump-bytes", default_value_t = 0)]
    pub max_dump_bytes: usize,

    /// Report the leak size without dumping the bytes
    #[arg(long = "no-dump", action = ArgAction::SetTrue)]
    pub no_dump: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Jsonl,
    Pretty,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Jsonl => write!(f, "jsonl"),
            Format::Pretty => write!(f, "pretty"),
        }
    }
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 || self.overall_timeout_ms == 0
        {
            anyhow::bail!("timeouts must be greater than zero");
        }

        if self.max_handshake_records == 0 {
            anyhow::bail!("max-handshake-records must be greater than zero");
        }

        if self.payload_size >= self.declared_length as usize {
            anyhow::bail!(
                "declared-length ({}) must exceed payload-size ({}) for the probe to detect anything",
                self.declared_length,
                self.payload_size
            );
        }

        if self.payload_size + HEARTBEAT_HEADER_LEN > u16::MAX as usize {
            anyhow::bail!("payload-size {} does not fit in one record", self.payload_size);
        }

        let target = heartbleed_probe::input::target_spec(&self.host, self.port)?;

        let cipher_suites = match &self.cipher_suites {
            Some(path) => CipherSuiteCatalog::from_file(path)?,
            None => CipherSuiteCatalog::default(),
        };

        let mut cfg = Config::for_target(target);
        cfg.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        cfg.read_timeout = Duration::from_millis(self.read_timeout_ms);
        cfg.overall_timeout = Duration::from_millis(self.overall_timeout_ms);
        cfg.max_handshake_records = self.max_handshake_records;
        cfg.heartbeat = HeartbeatConfig::with_payload_size(self.declared_length, self.payload_size);
        cfg.cipher_suites = cipher_suites;
        cfg.output = OutputConfig {
            format: match self.output {
                Format::Jsonl => OutputFormat::Jsonl,
                Format::Pretty => OutputFormat::Pretty,
            },
            dump: !self.no_dump,
            max_dump_bytes: (self.max_dump_bytes > 0).then_some(self.max_dump_bytes),
        };
        Ok(cfg)
    }
}
