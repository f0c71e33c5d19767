pub mod hex;

use std::sync::OnceLock;
use std::time::Instant;

/// Printable ASCII kept as is, everything else shown as `.`.
pub fn sanitize_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            0x20..=0x7e => *b as char,
            _ => '.',
        })
        .collect()
}

pub fn now_millis() -> u128 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    Instant::now().duration_since(*start).as_millis()
}

pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_non_printable() {
        assert_eq!(sanitize_text(b"ok\r\n\x00\xffz"), "ok....z");
    }

    #[test]
    fn timestamp_is_utc() {
        assert!(now_iso8601().ends_with('Z'));
    }
}
