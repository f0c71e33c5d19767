//! ClientHello construction and the inbound handshake reader.

use super::record::{self, ProtocolVersion, CONTENT_TYPE_ALERT, CONTENT_TYPE_HANDSHAKE};
use super::suites::{CipherSuiteCatalog, MAX_CIPHER_SUITES};
use crate::error::{EncodingError, ProbeError};
use rand::Rng;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

pub const HANDSHAKE_CLIENT_HELLO: u8 = 1;
pub const HANDSHAKE_SERVER_HELLO: u8 = 2;
pub const HANDSHAKE_CERTIFICATE: u8 = 11;
pub const HANDSHAKE_SERVER_KEY_EXCHANGE: u8 = 12;
pub const HANDSHAKE_SERVER_HELLO_DONE: u8 = 14;

pub const HANDSHAKE_HEADER_LEN: usize = 4;

pub const EXTENSION_HEARTBEAT: u16 = 0x000F;
/// RFC 6520 `peer_allowed_to_send`.
pub const HEARTBEAT_MODE_PEER_ALLOWED: u8 = 1;

const COMPRESSION_NULL: u8 = 0;
const MAX_U24: usize = 0x00FF_FFFF;

/// ClientHello random: 4 bytes of GMT unix time followed by 28 random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random([u8; 32]);

impl Random {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        let gmt = chrono::Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&gmt.to_be_bytes());
        rand::thread_rng().fill(&mut bytes[4..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub version: ProtocolVersion,
    pub random: Random,
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    /// Mode advertised in the heartbeat extension, `None` when absent.
    pub heartbeat_mode: Option<u8>,
}

impl ClientHello {
    /// TLS 1.2 hello offering `catalog`, null compression and nothing but the
    /// heartbeat extension.
    pub fn new(catalog: &CipherSuiteCatalog, random: Random) -> Self {
        Self {
            version: ProtocolVersion::TLS_1_2,
            random,
            session_id: Vec::new(),
            cipher_suites: catalog.ids().to_vec(),
            compression_methods: vec![COMPRESSION_NULL],
            heartbeat_mode: Some(HEARTBEAT_MODE_PEER_ALLOWED),
        }
    }

    /// Handshake message: `type(1) || length(3) || body`.
    pub fn encode_message(&self) -> Result<Vec<u8>, EncodingError> {
        if self.cipher_suites.is_empty() {
            return Err(EncodingError::EmptyCatalog);
        }
        if self.cipher_suites.len() > MAX_CIPHER_SUITES {
            return Err(EncodingError::CatalogTooLarge(self.cipher_suites.len()));
        }

        let mut body = Vec::with_capacity(64 + self.cipher_suites.len() * 2);
        body.extend_from_slice(&self.version.to_bytes());
        body.extend_from_slice(self.random.as_bytes());
        body.push(self.session_id.len() as u8);
        body.extend_from_slice(&self.session_id);
        body.extend_from_slice(&((self.cipher_suites.len() * 2) as u16).to_be_bytes());
        for id in &self.cipher_suites {
            body.extend_from_slice(&id.to_be_bytes());
        }
        body.push(self.compression_methods.len() as u8);
        body.extend_from_slice(&self.compression_methods);

        let mut extensions = Vec::new();
        if let Some(mode) = self.heartbeat_mode {
            extensions.extend_from_slice(&EXTENSION_HEARTBEAT.to_be_bytes());
            extensions.extend_from_slice(&1u16.to_be_bytes());
            extensions.push(mode);
        }
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        if body.len() > MAX_U24 {
            return Err(EncodingError::RecordTooLarge(body.len()));
        }
        let mut message = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
        message.push(HANDSHAKE_CLIENT_HELLO);
        message.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        message.extend_from_slice(&body);
        Ok(message)
    }

    /// The hello framed as handshake records, fragmented when it does not fit
    /// one record.
    pub fn to_records(&self) -> Result<Vec<u8>, EncodingError> {
        let message = self.encode_message()?;
        record::encode_fragmented(CONTENT_TYPE_HANDSHAKE, self.version, &message)
    }

    /// Parses a complete ClientHello handshake message, header included.
    pub fn decode(message: &[u8]) -> Result<Self, ProbeError> {
        let mut p = Parser::new(message);
        let msg_type = p.u8()?;
        if msg_type != HANDSHAKE_CLIENT_HELLO {
            return Err(ProbeError::ProtocolMismatch(format!(
                "expected ClientHello, found handshake type {msg_type}"
            )));
        }
        let length = p.u24()?;
        let mut p = Parser::new(p.take(length)?);

        let version = ProtocolVersion {
            major: p.u8()?,
            minor: p.u8()?,
        };
        let mut random = [0u8; 32];
        random.copy_from_slice(p.take(32)?);
        let session_len = p.u8()? as usize;
        let session_id = p.take(session_len)?.to_vec();
        let suites_len = p.u16()? as usize;
        if suites_len % 2 != 0 {
            return Err(ProbeError::ProtocolMismatch(
                "odd cipher-suite list length".into(),
            ));
        }
        let cipher_suites = p
            .take(suites_len)?
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        let compression_len = p.u8()? as usize;
        let compression_methods = p.take(compression_len)?.to_vec();

        let mut heartbeat_mode = None;
        if !p.is_empty() {
            let extensions_len = p.u16()? as usize;
            let mut ext = Parser::new(p.take(extensions_len)?);
            while !ext.is_empty() {
                let ext_type = ext.u16()?;
                let ext_len = ext.u16()? as usize;
                let data = ext.take(ext_len)?;
                if ext_type == EXTENSION_HEARTBEAT && data.len() == 1 {
                    heartbeat_mode = Some(data[0]);
                }
            }
        }

        Ok(Self {
            version,
            random: Random(random),
            session_id,
            cipher_suites,
            compression_methods,
            heartbeat_mode,
        })
    }
}

struct Parser<'a> {
    buf: &'a [u8],
}

impl<'a> Parser<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProbeError> {
        if self.buf.len() < n {
            return Err(ProbeError::ProtocolMismatch(format!(
                "truncated handshake message: wanted {n} bytes, {} left",
                self.buf.len()
            )));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, ProbeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ProbeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self) -> Result<usize, ProbeError> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]) as usize)
    }
}

/// What the reader saw before the server finished its hello flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandshakeSummary {
    pub records: usize,
    pub skipped_records: usize,
    pub message_types: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    AwaitRecord,
    AwaitHandshakeType,
    Done,
}

/// Consumes the server's handshake flight up to `ServerHelloDone`, discarding
/// every message body unparsed.
///
/// Handshake bytes are followed across record boundaries, so a record holding
/// several messages and a message spread over several records both work.
/// Records of other content types are skipped. Every record header counts
/// against `max_records`.
pub struct HandshakeReader {
    max_records: usize,
    record_remaining: usize,
    summary: HandshakeSummary,
}

impl HandshakeReader {
    pub fn new(max_records: usize) -> Self {
        Self {
            max_records,
            record_remaining: 0,
            summary: HandshakeSummary::default(),
        }
    }

    pub async fn read_until_server_hello_done<R: AsyncRead + Unpin>(
        mut self,
        stream: &mut R,
    ) -> Result<HandshakeSummary, ProbeError> {
        let mut state = ReaderState::AwaitRecord;
        loop {
            state = match state {
                ReaderState::AwaitRecord => {
                    if self.read_record(stream).await? && self.record_remaining > 0 {
                        ReaderState::AwaitHandshakeType
                    } else {
                        ReaderState::AwaitRecord
                    }
                }
                ReaderState::AwaitHandshakeType => {
                    let mut header = [0u8; HANDSHAKE_HEADER_LEN];
                    self.read_handshake(stream, &mut header).await?;
                    let msg_type = header[0];
                    let length = u32::from_be_bytes([0, header[1], header[2], header[3]]);
                    self.discard_handshake(stream, length as usize).await?;
                    self.summary.message_types.push(msg_type);
                    debug!(msg_type, length, "discarded handshake message");

                    if msg_type == HANDSHAKE_SERVER_HELLO_DONE {
                        ReaderState::Done
                    } else if self.record_remaining == 0 {
                        ReaderState::AwaitRecord
                    } else {
                        ReaderState::AwaitHandshakeType
                    }
                }
                ReaderState::Done => {
                    record::discard(stream, self.record_remaining as u64).await?;
                    return Ok(self.summary);
                }
            };
        }
    }

    /// Reads one record header. Returns `true` for a handshake record, whose
    /// payload is then left for the handshake layer; any other record is
    /// consumed whole.
    async fn read_record<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut R,
    ) -> Result<bool, ProbeError> {
        if self.summary.records >= self.max_records {
            return Err(ProbeError::ProtocolMismatch(format!(
                "no ServerHelloDone within {} records",
                self.max_records
            )));
        }
        let header = record::decode_header(stream).await?;
        self.summary.records += 1;

        if header.content_type == CONTENT_TYPE_HANDSHAKE {
            self.record_remaining = header.length as usize;
            return Ok(true);
        }

        self.summary.skipped_records += 1;
        if header.content_type == CONTENT_TYPE_ALERT && header.length == 2 {
            let mut alert = [0u8; 2];
            stream.read_exact(&mut alert).await?;
            warn!(
                alert_level = alert[0],
                alert_description = alert[1],
                "peer sent alert during handshake"
            );
        } else {
            debug!(
                content_type = header.content_type,
                length = header.length,
                "skipping non-handshake record"
            );
            record::discard(stream, header.length as u64).await?;
        }
        Ok(false)
    }

    async fn read_handshake<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut R,
        buf: &mut [u8],
    ) -> Result<(), ProbeError> {
        let mut filled = 0;
        while filled < buf.len() {
            self.ensure_record(stream).await?;
            let n = (buf.len() - filled).min(self.record_remaining);
            stream.read_exact(&mut buf[filled..filled + n]).await?;
            filled += n;
            self.record_remaining -= n;
        }
        Ok(())
    }

    async fn discard_handshake<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut R,
        mut len: usize,
    ) -> Result<(), ProbeError> {
        while len > 0 {
            self.ensure_record(stream).await?;
            let n = len.min(self.record_remaining);
            record::discard(stream, n as u64).await?;
            len -= n;
            self.record_remaining -= n;
        }
        Ok(())
    }

    async fn ensure_record<R: AsyncRead + Unpin>(
        &mut self,
        stream: &mut R,
    ) -> Result<(), ProbeError> {
        while self.record_remaining == 0 {
            self.read_record(stream).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::tls::record::{decode_header, encode, CONTENT_TYPE_HEARTBEAT, RECORD_HEADER_LEN};

    fn fixed_random() -> Random {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&[0x53, 0x4A, 0x84, 0xA9]);
        for (i, b) in bytes[4..].iter_mut().enumerate() {
            *b = i as u8;
        }
        Random::from_bytes(bytes)
    }

    fn handshake_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut msg = vec![msg_type];
        msg.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        msg.extend_from_slice(body);
        msg
    }

    fn handshake_record(messages: &[u8]) -> Vec<u8> {
        encode(CONTENT_TYPE_HANDSHAKE, ProtocolVersion::TLS_1_2, messages).unwrap()
    }

    #[test]
    fn default_hello_is_one_477_byte_record() {
        let hello = ClientHello::new(&CipherSuiteCatalog::default(), fixed_random());
        let bytes = hello.to_records().unwrap();

        assert_eq!(&bytes[..5], &[0x16, 0x03, 0x03, 0x01, 0xD8]);
        assert_eq!(&bytes[5..11], &[0x01, 0x00, 0x01, 0xD4, 0x03, 0x03]);
        assert_eq!(&bytes[11..15], &[0x53, 0x4A, 0x84, 0xA9]);
        // session id length, then the suite list byte count
        assert_eq!(&bytes[43..46], &[0x00, 0x01, 0xA6]);
        assert_eq!(bytes.len(), 5 + 0x01D8);
    }

    #[test]
    fn hello_ends_with_compression_and_heartbeat_extension() {
        let hello = ClientHello::new(&CipherSuiteCatalog::default(), fixed_random());
        let bytes = hello.to_records().unwrap();
        let tail = &bytes[bytes.len() - 9..];
        assert_eq!(tail, &[0x01, 0x00, 0x00, 0x05, 0x00, 0x0F, 0x00, 0x01, 0x01]);
        let suites_end = bytes.len() - 9;
        assert_eq!(&bytes[suites_end - 2..suites_end], &[0xFF, 0xE0]);
    }

    #[test]
    fn generated_random_carries_current_time() {
        let random = Random::generate();
        let gmt = u32::from_be_bytes(random.as_bytes()[..4].try_into().unwrap());
        let now = chrono::Utc::now().timestamp() as u32;
        assert!(now.abs_diff(gmt) <= 5);
    }

    #[tokio::test]
    async fn cipher_suites_survive_encode_and_decode() {
        for n in [1usize, 2, 211, 8_200, MAX_CIPHER_SUITES] {
            let ids: Vec<u16> = (0..n).map(|i| (i as u16).wrapping_mul(7919)).collect();
            let catalog = CipherSuiteCatalog::from_ids(ids.clone()).unwrap();
            let hello = ClientHello::new(&catalog, fixed_random());
            let records = hello.to_records().unwrap();

            let mut stream: &[u8] = &records;
            let mut message = Vec::new();
            while !stream.is_empty() {
                let header = decode_header(&mut stream).await.unwrap();
                assert_eq!(header.content_type, CONTENT_TYPE_HANDSHAKE);
                let mut fragment = vec![0u8; header.length as usize];
                stream.read_exact(&mut fragment).await.unwrap();
                message.extend_from_slice(&fragment);
            }

            let decoded = ClientHello::decode(&message).unwrap();
            assert_eq!(decoded.cipher_suites, ids);
            assert_eq!(decoded, hello);
        }
    }

    #[test]
    fn empty_suite_list_is_rejected() {
        let mut hello = ClientHello::new(&CipherSuiteCatalog::default(), fixed_random());
        hello.cipher_suites.clear();
        assert_eq!(hello.to_records().unwrap_err(), EncodingError::EmptyCatalog);
    }

    #[tokio::test]
    async fn stops_at_server_hello_done() {
        let mut wire = Vec::new();
        wire.extend(handshake_record(&handshake_message(HANDSHAKE_SERVER_HELLO, &[0xAA; 70])));
        wire.extend(handshake_record(&handshake_message(HANDSHAKE_CERTIFICATE, &[0xBB; 900])));
        let key_exchange = handshake_message(HANDSHAKE_SERVER_KEY_EXCHANGE, &[0xCC; 300]);
        wire.extend(handshake_record(&key_exchange));
        wire.extend(handshake_record(&handshake_message(HANDSHAKE_SERVER_HELLO_DONE, &[])));
        wire.extend(encode(CONTENT_TYPE_HEARTBEAT, ProtocolVersion::TLS_1_2, &[2, 0, 0]).unwrap());

        let mut stream: &[u8] = &wire;
        let summary = HandshakeReader::new(16)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.message_types, vec![2, 11, 12, 14]);
        assert_eq!(stream[0], CONTENT_TYPE_HEARTBEAT);
    }

    #[tokio::test]
    async fn follows_messages_across_record_boundaries() {
        let mut flight = handshake_message(HANDSHAKE_SERVER_HELLO, &[1; 40]);
        flight.extend(handshake_message(HANDSHAKE_CERTIFICATE, &[2; 500]));
        flight.extend(handshake_message(HANDSHAKE_SERVER_HELLO_DONE, &[]));

        // one message split mid-header, the rest coalesced
        let mut wire = handshake_record(&flight[..46]);
        wire.extend(handshake_record(&flight[46..]));

        let mut stream: &[u8] = &wire;
        let summary = HandshakeReader::new(16)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap();
        assert_eq!(summary.message_types, vec![2, 11, 14]);
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn drops_trailing_bytes_after_server_hello_done() {
        let mut body = handshake_message(HANDSHAKE_SERVER_HELLO_DONE, &[]);
        body.extend_from_slice(&[0xEE; 7]);
        let mut wire = handshake_record(&body);
        wire.extend(encode(CONTENT_TYPE_HEARTBEAT, ProtocolVersion::TLS_1_2, &[2, 0, 0]).unwrap());

        let mut stream: &[u8] = &wire;
        let summary = HandshakeReader::new(16)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap();
        assert_eq!(summary.message_types, vec![14]);
        assert_eq!(summary.records, 1);
        assert_eq!(stream[0], CONTENT_TYPE_HEARTBEAT);
        assert_eq!(stream.len(), RECORD_HEADER_LEN + 3);
    }

    #[tokio::test]
    async fn skips_records_of_other_content_types() {
        let mut wire = encode(20, ProtocolVersion::TLS_1_2, &[1]).unwrap();
        wire.extend(encode(CONTENT_TYPE_ALERT, ProtocolVersion::TLS_1_2, &[1, 0]).unwrap());
        wire.extend(handshake_record(&handshake_message(HANDSHAKE_SERVER_HELLO_DONE, &[])));

        let mut stream: &[u8] = &wire;
        let summary = HandshakeReader::new(16)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap();
        assert_eq!(summary.skipped_records, 2);
        assert_eq!(summary.message_types, vec![14]);
    }

    #[tokio::test]
    async fn gives_up_after_record_bound() {
        let mut wire = Vec::new();
        for _ in 0..10 {
            wire.extend(handshake_record(&handshake_message(HANDSHAKE_CERTIFICATE, &[0; 4])));
        }
        let mut stream: &[u8] = &wire;
        let err = HandshakeReader::new(3)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::ProtocolMismatch(_)));
    }

    #[tokio::test]
    async fn closed_stream_is_transport_error() {
        let wire = handshake_record(&handshake_message(HANDSHAKE_SERVER_HELLO, &[0; 10]));
        let mut stream: &[u8] = &wire[..wire.len() - 3];
        let err = HandshakeReader::new(16)
            .read_until_server_hello_done(&mut stream)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Transport(TransportError::Closed)));
    }
}
