pub mod handshake;
pub mod heartbeat;
pub mod record;
pub mod suites;

pub use handshake::{ClientHello, HandshakeReader, HandshakeSummary, Random};
pub use heartbeat::{read_heartbeat_reply, HeartbeatReply, HeartbeatRequest};
pub use record::{ProtocolVersion, RecordHeader};
pub use suites::CipherSuiteCatalog;
