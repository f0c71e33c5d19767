use crate::error::ProbeError;
use crate::model::{Config, ProbeOutcome, ProbeStage, SafeObservation};
use crate::tls::{
    read_heartbeat_reply, ClientHello, HandshakeReader, HandshakeSummary, HeartbeatReply,
    HeartbeatRequest, ProtocolVersion, Random,
};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Wire bytes for one probe, built before any connection is opened.
#[derive(Debug, Clone)]
pub struct ProbeMessages {
    pub client_hello: Vec<u8>,
    pub heartbeat: Vec<u8>,
    /// Payload length claimed in the heartbeat request.
    pub declared_length: u16,
    /// Heartbeat payload bytes actually transmitted.
    pub payload_len: usize,
}

impl ProbeMessages {
    pub fn build(cfg: &Config) -> Result<Self, ProbeError> {
        Self::build_with_random(cfg, Random::generate())
    }

    pub fn build_with_random(cfg: &Config, random: Random) -> Result<Self, ProbeError> {
        let hello = ClientHello::new(&cfg.cipher_suites, random);
        let request =
            HeartbeatRequest::new(cfg.heartbeat.declared_length, cfg.heartbeat.payload.clone());
        Ok(Self {
            client_hello: hello.to_records()?,
            heartbeat: request.to_record(ProtocolVersion::TLS_1_2)?,
            declared_length: cfg.heartbeat.declared_length,
            payload_len: request.transmitted_payload_len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Exchange {
    pub handshake: Option<HandshakeSummary>,
    pub outcome: ProbeOutcome,
}

/// Runs the handshake and heartbeat phases over an established stream and
/// classifies the result. Failures after connect never escape: they become
/// [`ProbeOutcome::Indeterminate`] tagged with the phase they happened in.
pub async fn exchange<S>(
    stream: &mut S,
    messages: &ProbeMessages,
    read_timeout: Duration,
    max_handshake_records: usize,
) -> Exchange
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(
        stage = %ProbeStage::Handshaking,
        bytes = messages.client_hello.len(),
        "sending ClientHello"
    );
    let handshake = match phase(read_timeout, async {
        stream.write_all(&messages.client_hello).await?;
        stream.flush().await?;
        HandshakeReader::new(max_handshake_records)
            .read_until_server_hello_done(&mut *stream)
            .await
    })
    .await
    {
        Ok(summary) => summary,
        Err(err) => return indeterminate(ProbeStage::Handshaking, err, None),
    };
    debug!(records = handshake.records, "ServerHelloDone received");

    debug!(
        stage = %ProbeStage::Heartbeating,
        declared_length = messages.declared_length,
        payload_len = messages.payload_len,
        "sending heartbeat request"
    );
    let reply = match phase(read_timeout, async {
        stream.write_all(&messages.heartbeat).await?;
        stream.flush().await?;
        read_heartbeat_reply(&mut *stream).await
    })
    .await
    {
        Ok(reply) => reply,
        Err(err) => return indeterminate(ProbeStage::Heartbeating, err, Some(handshake)),
    };

    debug!(stage = %ProbeStage::Classifying, "classifying heartbeat reply");
    Exchange {
        handshake: Some(handshake),
        outcome: classify(reply, messages.payload_len),
    }
}

/// More bytes back than were sent means the peer read past the payload.
pub fn classify(reply: HeartbeatReply, transmitted_payload_len: usize) -> ProbeOutcome {
    match reply {
        HeartbeatReply::NotHeartbeat { content_type } => {
            ProbeOutcome::Safe(SafeObservation::NotHeartbeat { content_type })
        }
        HeartbeatReply::Echo { payload, .. } if payload.len() > transmitted_payload_len => {
            ProbeOutcome::Vulnerable { leaked: payload }
        }
        HeartbeatReply::Echo { payload, .. } => {
            ProbeOutcome::Safe(SafeObservation::EchoWithinBounds {
                echoed: payload.len(),
            })
        }
    }
}

async fn phase<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ProbeError>>,
) -> Result<T, ProbeError> {
    match timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(crate::error::TransportError::Timeout(limit).into()),
    }
}

fn indeterminate(
    stage: ProbeStage,
    err: ProbeError,
    handshake: Option<HandshakeSummary>,
) -> Exchange {
    warn!(%stage, error = %err, "probe did not complete");
    Exchange {
        handshake,
        outcome: ProbeOutcome::Indeterminate {
            stage,
            reason: err.to_string(),
        },
    }
}
