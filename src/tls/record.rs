//! Outer TLS record framing: `type(1) || version(2) || length(2) || payload`.

use crate::error::{EncodingError, TransportError};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const CONTENT_TYPE_ALERT: u8 = 21;
pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;
pub const CONTENT_TYPE_HEARTBEAT: u8 = 24;

pub const RECORD_HEADER_LEN: usize = 5;

/// Largest plaintext fragment a record may carry (RFC 5246 6.2.1).
pub const MAX_FRAGMENT_LEN: usize = 1 << 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const TLS_1_2: ProtocolVersion = ProtocolVersion { major: 3, minor: 3 };

    pub fn to_bytes(self) -> [u8; 2] {
        [self.major, self.minor]
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: u8,
    pub version: ProtocolVersion,
    pub length: u16,
}

/// Frames `payload` as a single record.
pub fn encode(
    content_type: u8,
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    let length =
        u16::try_from(payload.len()).map_err(|_| EncodingError::RecordTooLarge(payload.len()))?;
    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    record.push(content_type);
    record.extend_from_slice(&version.to_bytes());
    record.extend_from_slice(&length.to_be_bytes());
    record.extend_from_slice(payload);
    Ok(record)
}

/// Frames `payload` over as many records as needed, each carrying at most
/// [`MAX_FRAGMENT_LEN`] bytes. An empty payload still yields one record.
pub fn encode_fragmented(
    content_type: u8,
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    if payload.is_empty() {
        return encode(content_type, version, payload);
    }
    let mut out = Vec::with_capacity(
        payload.len() + RECORD_HEADER_LEN * payload.len().div_ceil(MAX_FRAGMENT_LEN),
    );
    for fragment in payload.chunks(MAX_FRAGMENT_LEN) {
        out.extend_from_slice(&encode(content_type, version, fragment)?);
    }
    Ok(out)
}

/// Reads exactly one record header. The payload is left on the stream.
pub async fn decode_header<R: AsyncRead + Unpin>(
    stream: &mut R,
) -> Result<RecordHeader, TransportError> {
    let mut header = [0u8; RECORD_HEADER_LEN];
    stream.read_exact(&mut header).await?;
    Ok(RecordHeader {
        content_type: header[0],
        version: ProtocolVersion {
            major: header[1],
            minor: header[2],
        },
        length: u16::from_be_bytes([header[3], header[4]]),
    })
}

/// Consumes and drops exactly `len` bytes.
pub async fn discard<R: AsyncRead + Unpin>(stream: &mut R, len: u64) -> Result<(), TransportError> {
    if len == 0 {
        return Ok(());
    }
    let copied = tokio::io::copy(&mut (&mut *stream).take(len), &mut tokio::io::sink()).await?;
    if copied < len {
        return Err(TransportError::Closed);
    }
    Ok(())
}
