//! RFC 6520 heartbeat messages.
//!
//! The request built here carries a declared payload length larger than the
//! payload actually sent, and no padding. A patched peer drops it; an affected
//! OpenSSL copies `declared_length` bytes starting at the payload and sends
//! them back.

use super::record::{self, ProtocolVersion, CONTENT_TYPE_HEARTBEAT};
use crate::error::{EncodingError, ProbeError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

pub const HEARTBEAT_REQUEST: u8 = 1;
pub const HEARTBEAT_RESPONSE: u8 = 2;

pub const HEARTBEAT_HEADER_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub declared_length: u16,
    pub payload: Vec<u8>,
}

impl HeartbeatRequest {
    pub fn new(declared_length: u16, payload: Vec<u8>) -> Self {
        Self {
            declared_length,
            payload,
        }
    }

    /// Payload bytes that actually go on the wire, as opposed to the
    /// declared length.
    pub fn transmitted_payload_len(&self) -> usize {
        self.payload.len()
    }

    pub fn encode_message(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(HEARTBEAT_HEADER_LEN + self.payload.len());
        message.push(HEARTBEAT_REQUEST);
        message.extend_from_slice(&self.declared_length.to_be_bytes());
        message.extend_from_slice(&self.payload);
        message
    }

    pub fn to_record(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        record::encode(CONTENT_TYPE_HEARTBEAT, version, &self.encode_message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatReply {
    /// The first record after the request was not a heartbeat.
    NotHeartbeat { content_type: u8 },
    Echo {
        msg_type: u8,
        declared_length: u16,
        payload: Vec<u8>,
    },
}

/// Reads one record and, when it is a heartbeat, exactly as many payload
/// bytes as the peer declares. Padding is left unread.
pub async fn read_heartbeat_reply<R: AsyncRead + Unpin>(
    stream: &mut R,
) -> Result<HeartbeatReply, ProbeError> {
    let header = record::decode_header(stream).await?;
    if header.content_type != CONTENT_TYPE_HEARTBEAT {
        debug!(
            content_type = header.content_type,
            length = header.length,
            "peer answered heartbeat with another content type"
        );
        return Ok(HeartbeatReply::NotHeartbeat {
            content_type: header.content_type,
        });
    }

    let mut message_header = [0u8; HEARTBEAT_HEADER_LEN];
    stream.read_exact(&mut message_header).await?;
    let msg_type = message_header[0];
    let declared_length = u16::from_be_bytes([message_header[1], message_header[2]]);
    if msg_type != HEARTBEAT_RESPONSE {
        warn!(msg_type, "unexpected heartbeat message type, reading it anyway");
    }

    let mut payload = vec![0u8; declared_length as usize];
    stream.read_exact(&mut payload).await?;
    debug!(
        record_length = header.length,
        declared_length, "read heartbeat response"
    );

    Ok(HeartbeatReply::Echo {
        msg_type,
        declared_length,
        payload,
    })
}
