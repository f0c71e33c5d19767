pub mod exchange;

use crate::error::{ProbeError, TransportError};
use crate::model::{Config, ProbeReport, ProbeStage, Target};
use crate::util::{now_iso8601, now_millis};
use exchange::{exchange, ProbeMessages};
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// Probes one target over one connection.
pub struct HeartbleedProbe {
    cfg: Config,
}

impl HeartbleedProbe {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Builds both messages, then connects and runs the exchange, all within
    /// the overall timeout.
    ///
    /// `Err` is reserved for probes that never reached the target (bad
    /// configuration, resolution or connect failure) or ran out of overall
    /// time; anything that goes wrong once connected is reported as an
    /// indeterminate outcome.
    #[instrument(skip(self), fields(target = %self.cfg.target))]
    pub async fn run(&self) -> Result<ProbeReport, ProbeError> {
        let messages = ProbeMessages::build(&self.cfg)?;
        match timeout(self.cfg.overall_timeout, self.run_with(&messages)).await {
            Ok(res) => res,
            Err(_) => Err(TransportError::Timeout(self.cfg.overall_timeout).into()),
        }
    }

    async fn run_with(&self, messages: &ProbeMessages) -> Result<ProbeReport, ProbeError> {
        let target = crate::input::resolve(&self.cfg.target).await?;
        let tcp_start = now_millis();
        let mut stream = self.connect(&target).await?;
        let connect_ms = now_millis() - tcp_start;
        debug!(target = %target.resolved, ms = connect_ms, "connected");

        let session = exchange(
            &mut stream,
            messages,
            self.cfg.read_timeout,
            self.cfg.max_handshake_records,
        )
        .await;

        let _ = stream.shutdown().await;
        drop(stream);
        debug!(
            stage = %ProbeStage::Closed,
            outcome = session.outcome.status_text(),
            "connection released"
        );

        Ok(ProbeReport {
            target: target.view(),
            timestamp: now_iso8601(),
            connect_ms: Some(connect_ms),
            handshake: session.handshake,
            outcome: session.outcome,
        })
    }

    async fn connect(&self, target: &Target) -> Result<TcpStream, ProbeError> {
        debug!(stage = %ProbeStage::Connecting, addr = %target.resolved, "opening connection");
        let connecting = TcpStream::connect(target.resolved);
        let source = match timeout(self.cfg.connect_timeout, connecting).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                return Ok(stream);
            }
            Ok(Err(err)) => err,
            Err(_) => io::Error::new(io::ErrorKind::TimedOut, "connect timeout"),
        };
        Err(TransportError::Connect {
            addr: target.resolved.to_string(),
            source,
        }
        .into())
    }
}
