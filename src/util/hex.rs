use super::sanitize_text;
use std::fmt::Write;

const DUMP_WIDTH: usize = 16;

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Classic hex dump: offset, sixteen hex bytes split in two groups of eight,
/// then the printable column.
///
/// ```text
/// 00000000  48 54 54 50 2f 31 2e 31  20 32 30 30 20 4f 4b 0d  |HTTP/1.1 200 OK.|
/// ```
pub fn dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(DUMP_WIDTH).enumerate() {
        let _ = write!(out, "{:08x} ", row * DUMP_WIDTH);
        for col in 0..DUMP_WIDTH {
            if col % 8 == 0 {
                out.push(' ');
            }
            match chunk.get(col) {
                Some(b) => {
                    let _ = write!(out, "{:02x} ", b);
                }
                None => out.push_str("   "),
            }
        }
        let _ = writeln!(out, " |{}|", sanitize_text(chunk));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hex() {
        assert_eq!(to_hex(&[0xde, 0xad, 0x01]), "dead01");
    }

    #[test]
    fn dumps_full_and_partial_rows() {
        let bytes: Vec<u8> = b"HTTP/1.1 200 OK\r\nX".to_vec();
        let text = dump(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "00000000  48 54 54 50 2f 31 2e 31  20 32 30 30 20 4f 4b 0d  |HTTP/1.1 200 OK.|"
        );
        assert!(lines[1].starts_with("00000010  0a 58 "));
        assert!(lines[1].ends_with("|.X|"));
        assert_eq!(lines[0].len(), lines[1].len() + 14);
    }

    #[test]
    fn empty_input_dumps_nothing() {
        assert!(dump(&[]).is_empty());
    }
}
