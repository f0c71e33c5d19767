//! Heartbleed (CVE-2014-0160) probe.
//!
//! Sends a TLS 1.2 ClientHello advertising the heartbeat extension, waits for
//! `ServerHelloDone`, then sends one heartbeat request that claims a much
//! longer payload than it carries. A peer that echoes back more bytes than it
//! received has read past the request buffer.

pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod tls;
pub mod util;
