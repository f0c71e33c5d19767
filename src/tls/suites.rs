//! Compiled-in cipher-suite catalog and the loader for operator-supplied
//! catalogs.
//!
//! The default list is deliberately exhaustive, legacy and export suites
//! included, so that any server still running an affected OpenSSL release
//! finds at least one suite it is willing to negotiate.

use crate::error::EncodingError;
use std::path::Path;

/// Largest number of suites whose byte count still fits the u16 length prefix.
pub const MAX_CIPHER_SUITES: usize = 0x7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub id: u16,
    pub name: &'static str,
}

const fn suite(id: u16, name: &'static str) -> CipherSuite {
    CipherSuite { id, name }
}

pub const DEFAULT_CIPHER_SUITES: &[CipherSuite] = &[
    suite(0x0000, "TLS_NULL_WITH_NULL_NULL"),
    suite(0x0001, "TLS_RSA_WITH_NULL_MD5"),
    suite(0x0002, "TLS_RSA_WITH_NULL_SHA"),
    suite(0x0003, "TLS_RSA_EXPORT_WITH_RC4_40_MD5"),
    suite(0x0004, "TLS_RSA_WITH_RC4_128_MD5"),
    suite(0x0005, "TLS_RSA_WITH_RC4_128_SHA"),
    suite(0x0006, "TLS_RSA_EXPORT_WITH_RC2_CBC_40_MD5"),
    suite(0x0007, "TLS_RSA_WITH_IDEA_CBC_SHA"),
    suite(0x0008, "TLS_RSA_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x0009, "TLS_RSA_WITH_DES_CBC_SHA"),
    suite(0x000A, "TLS_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0x000B, "TLS_DH_DSS_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x000C, "TLS_DH_DSS_WITH_DES_CBC_SHA"),
    suite(0x000D, "TLS_DH_DSS_WITH_3DES_EDE_CBC_SHA"),
    suite(0x000E, "TLS_DH_RSA_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x000F, "TLS_DH_RSA_WITH_DES_CBC_SHA"),
    suite(0x0010, "TLS_DH_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0011, "TLS_DHE_DSS_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x0012, "TLS_DHE_DSS_WITH_DES_CBC_SHA"),
    suite(0x0013, "TLS_DHE_DSS_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0014, "TLS_DHE_RSA_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x0015, "TLS_DHE_RSA_WITH_DES_CBC_SHA"),
    suite(0x0016, "TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0017, "TLS_DH_Anon_EXPORT_WITH_RC4_40_MD5"),
    suite(0x0018, "TLS_DH_Anon_WITH_RC4_128_MD5"),
    suite(0x0019, "TLS_DH_Anon_EXPORT_WITH_DES40_CBC_SHA"),
    suite(0x001A, "TLS_DH_Anon_WITH_DES_CBC_SHA"),
    suite(0x001B, "TLS_DH_Anon_WITH_3DES_EDE_CBC_SHA"),
    suite(0x001C, "SSL_FORTEZZA_KEA_WITH_NULL_SHA"),
    suite(0x001D, "SSL_FORTEZZA_KEA_WITH_FORTEZZA_CBC_SHA"),
    suite(0x001E, "TLS_KRB5_WITH_DES_CBC_SHA"),
    suite(0x001F, "TLS_KRB5_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0020, "TLS_KRB5_WITH_RC4_128_SHA"),
    suite(0x0021, "TLS_KRB5_WITH_IDEA_CBC_SHA"),
    suite(0x0022, "TLS_KRB5_WITH_DES_CBC_MD5"),
    suite(0x0023, "TLS_KRB5_WITH_3DES_EDE_CBC_MD5"),
    suite(0x0024, "TLS_KRB5_WITH_RC4_128_MD5"),
    suite(0x0025, "TLS_KRB5_WITH_IDEA_CBC_MD5"),
    suite(0x0026, "TLS_KRB5_EXPORT_WITH_DES_CBC_40_SHA"),
    suite(0x0027, "TLS_KRB5_EXPORT_WITH_RC2_CBC_40_SHA"),
    suite(0x0028, "TLS_KRB5_EXPORT_WITH_RC4_40_SHA"),
    suite(0x0029, "TLS_KRB5_EXPORT_WITH_DES_CBC_40_MD5"),
    suite(0x002A, "TLS_KRB5_EXPORT_WITH_RC2_CBC_40_MD5"),
    suite(0x002B, "TLS_KRB5_EXPORT_WITH_RC4_40_MD5"),
    suite(0x002C, "TLS_PSK_WITH_NULL_SHA"),
    suite(0x002D, "TLS_DHE_PSK_WITH_NULL_SHA"),
    suite(0x002E, "TLS_RSA_PSK_WITH_NULL_SHA"),
    suite(0x002F, "TLS_RSA_WITH_AES_128_CBC_SHA"),
    suite(0x0030, "TLS_DH_DSS_WITH_AES_128_CBC_SHA"),
    suite(0x0031, "TLS_DH_RSA_WITH_AES_128_CBC_SHA"),
    suite(0x0032, "TLS_DHE_DSS_WITH_AES_128_CBC_SHA"),
    suite(0x0033, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA"),
    suite(0x0034, "TLS_DH_Anon_WITH_AES_128_CBC_SHA"),
    suite(0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA"),
    suite(0x0036, "TLS_DH_DSS_WITH_AES_256_CBC_SHA"),
    suite(0x0037, "TLS_DH_RSA_WITH_AES_256_CBC_SHA"),
    suite(0x0038, "TLS_DHE_DSS_WITH_AES_256_CBC_SHA"),
    suite(0x0039, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA"),
    suite(0x003A, "TLS_DH_Anon_WITH_AES_256_CBC_SHA"),
    suite(0x003B, "TLS_RSA_WITH_NULL_SHA256"),
    suite(0x003C, "TLS_RSA_WITH_AES_128_CBC_SHA256"),
    suite(0x003D, "TLS_RSA_WITH_AES_256_CBC_SHA256"),
    suite(0x003E, "TLS_DH_DSS_WITH_AES_128_CBC_SHA256"),
    suite(0x003F, "TLS_DH_RSA_WITH_AES_128_CBC_SHA256"),
    suite(0x0040, "TLS_DHE_DSS_WITH_AES_128_CBC_SHA256"),
    suite(0x0041, "TLS_RSA_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0042, "TLS_DH_DSS_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0043, "TLS_DH_RSA_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0044, "TLS_DHE_DSS_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0045, "TLS_DHE_RSA_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0046, "TLS_DH_Anon_WITH_CAMELLIA_128_CBC_SHA"),
    suite(0x0047, "TLS_ECDH_ECDSA_WITH_NULL_SHA"),
    suite(0x0048, "TLS_ECDH_ECDSA_WITH_RC4_128_SHA"),
    suite(0x0049, "TLS_ECDH_ECDSA_WITH_DES_CBC_SHA"),
    suite(0x004A, "TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0x004B, "TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA"),
    suite(0x004C, "TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA"),
    suite(0x0060, "TLS_RSA_EXPORT1024_WITH_RC4_56_MD5"),
    suite(0x0061, "TLS_RSA_EXPORT1024_WITH_RC2_CBC_56_MD5"),
    suite(0x0062, "TLS_RSA_EXPORT1024_WITH_DES_CBC_SHA"),
    suite(0x0063, "TLS_DHE_DSS_EXPORT1024_WITH_DES_CBC_SHA"),
    suite(0x0064, "TLS_RSA_EXPORT1024_WITH_RC4_56_SHA"),
    suite(0x0065, "TLS_DHE_DSS_EXPORT1024_WITH_RC4_56_SHA"),
    suite(0x0066, "TLS_DHE_DSS_WITH_RC4_128_SHA"),
    suite(0x0067, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA256"),
    suite(0x0068, "TLS_DH_DSS_WITH_AES_256_CBC_SHA256"),
    suite(0x0069, "TLS_DH_RSA_WITH_AES_256_CBC_SHA256"),
    suite(0x006A, "TLS_DHE_DSS_WITH_AES_256_CBC_SHA256"),
    suite(0x006B, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA256"),
    suite(0x006C, "TLS_DH_Anon_WITH_AES_128_CBC_SHA256"),
    suite(0x006D, "TLS_DH_Anon_WITH_AES_256_CBC_SHA256"),
    suite(0x0080, "TLS_GOSTR341094_WITH_28147_CNT_IMIT"),
    suite(0x0081, "TLS_GOSTR341001_WITH_28147_CNT_IMIT"),
    suite(0x0082, "TLS_GOSTR341094_WITH_NULL_GOSTR3411"),
    suite(0x0083, "TLS_GOSTR341001_WITH_NULL_GOSTR3411"),
    suite(0x0084, "TLS_RSA_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x0085, "TLS_DH_DSS_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x0086, "TLS_DH_RSA_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x0087, "TLS_DHE_DSS_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x0088, "TLS_DHE_RSA_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x0089, "TLS_DH_Anon_WITH_CAMELLIA_256_CBC_SHA"),
    suite(0x008A, "TLS_PSK_WITH_RC4_128_SHA"),
    suite(0x008B, "TLS_PSK_WITH_3DES_EDE_CBC_SHA"),
    suite(0x008C, "TLS_PSK_WITH_AES_128_CBC_SHA"),
    suite(0x008D, "TLS_PSK_WITH_AES_256_CBC_SHA"),
    suite(0x008E, "TLS_DHE_PSK_WITH_RC4_128_SHA"),
    suite(0x008F, "TLS_DHE_PSK_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0090, "TLS_DHE_PSK_WITH_AES_128_CBC_SHA"),
    suite(0x0091, "TLS_DHE_PSK_WITH_AES_256_CBC_SHA"),
    suite(0x0092, "TLS_RSA_PSK_WITH_RC4_128_SHA"),
    suite(0x0093, "TLS_RSA_PSK_WITH_3DES_EDE_CBC_SHA"),
    suite(0x0094, "TLS_RSA_PSK_WITH_AES_128_CBC_SHA"),
    suite(0x0095, "TLS_RSA_PSK_WITH_AES_256_CBC_SHA"),
    suite(0x0096, "TLS_RSA_WITH_SEED_CBC_SHA"),
    suite(0x0097, "TLS_DH_DSS_WITH_SEED_CBC_SHA"),
    suite(0x0098, "TLS_DH_RSA_WITH_SEED_CBC_SHA"),
    suite(0x0099, "TLS_DHE_DSS_WITH_SEED_CBC_SHA"),
    suite(0x009A, "TLS_DHE_RSA_WITH_SEED_CBC_SHA"),
    suite(0x009B, "TLS_DH_Anon_WITH_SEED_CBC_SHA"),
    suite(0x009C, "TLS_RSA_WITH_AES_128_GCM_SHA256"),
    suite(0x009D, "TLS_RSA_WITH_AES_256_GCM_SHA384"),
    suite(0x009E, "TLS_DHE_RSA_WITH_AES_128_GCM_SHA256"),
    suite(0x009F, "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384"),
    suite(0x00A0, "TLS_DH_RSA_WITH_AES_128_GCM_SHA256"),
    suite(0x00A1, "TLS_DH_RSA_WITH_AES_256_GCM_SHA384"),
    suite(0x00A2, "TLS_DHE_DSS_WITH_AES_128_GCM_SHA256"),
    suite(0x00A3, "TLS_DHE_DSS_WITH_AES_256_GCM_SHA384"),
    suite(0x00A4, "TLS_DH_DSS_WITH_AES_128_GCM_SHA256"),
    suite(0x00A5, "TLS_DH_DSS_WITH_AES_256_GCM_SHA384"),
    suite(0x00A6, "TLS_DH_Anon_WITH_AES_128_GCM_SHA256"),
    suite(0x00A7, "TLS_DH_Anon_WITH_AES_256_GCM_SHA384"),
    suite(0x00A8, "TLS_PSK_WITH_AES_128_GCM_SHA256"),
    suite(0x00A9, "TLS_PSK_WITH_AES_256_GCM_SHA384"),
    suite(0x00AA, "TLS_DHE_PSK_WITH_AES_128_GCM_SHA256"),
    suite(0x00AB, "TLS_DHE_PSK_WITH_AES_256_GCM_SHA384"),
    suite(0x00AC, "TLS_RSA_PSK_WITH_AES_128_GCM_SHA256"),
    suite(0x00AD, "TLS_RSA_PSK_WITH_AES_256_GCM_SHA384"),
    suite(0x00AE, "TLS_PSK_WITH_AES_128_CBC_SHA256"),
    suite(0x00AF, "TLS_PSK_WITH_AES_256_CBC_SHA384"),
    suite(0x00B0, "TLS_PSK_WITH_NULL_SHA256"),
    suite(0x00B1, "TLS_PSK_WITH_NULL_SHA384"),
    suite(0x00B2, "TLS_DHE_PSK_WITH_AES_128_CBC_SHA256"),
    suite(0x00B3, "TLS_DHE_PSK_WITH_AES_256_CBC_SHA384"),
    suite(0x00B4, "TLS_DHE_PSK_WITH_NULL_SHA256"),
    suite(0x00B5, "TLS_DHE_PSK_WITH_NULL_SHA384"),
    suite(0x00B6, "TLS_RSA_PSK_WITH_AES_128_CBC_SHA256"),
    suite(0x00B7, "TLS_RSA_PSK_WITH_AES_256_CBC_SHA384"),
    suite(0x00B8, "TLS_RSA_PSK_WITH_NULL_SHA256"),
    suite(0x00B9, "TLS_RSA_PSK_WITH_NULL_SHA384"),
    suite(0xC001, "TLS_ECDH_ECDSA_WITH_NULL_SHA"),
    suite(0xC002, "TLS_ECDH_ECDSA_WITH_RC4_128_SHA"),
    suite(0xC003, "TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC004, "TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA"),
    suite(0xC005, "TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA"),
    suite(0xC006, "TLS_ECDHE_ECDSA_WITH_NULL_SHA"),
    suite(0xC007, "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA"),
    suite(0xC008, "TLS_ECDHE_ECDSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA"),
    suite(0xC00A, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA"),
    suite(0xC00B, "TLS_ECDH_RSA_WITH_NULL_SHA"),
    suite(0xC00C, "TLS_ECDH_RSA_WITH_RC4_128_SHA"),
    suite(0xC00D, "TLS_ECDH_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC00E, "TLS_ECDH_RSA_WITH_AES_128_CBC_SHA"),
    suite(0xC00F, "TLS_ECDH_RSA_WITH_AES_256_CBC_SHA"),
    suite(0xC010, "TLS_ECDHE_RSA_WITH_NULL_SHA"),
    suite(0xC011, "TLS_ECDHE_RSA_WITH_RC4_128_SHA"),
    suite(0xC012, "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA"),
    suite(0xC014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA"),
    suite(0xC015, "TLS_ECDH_Anon_WITH_NULL_SHA"),
    suite(0xC016, "TLS_ECDH_Anon_WITH_RC4_128_SHA"),
    suite(0xC017, "TLS_ECDH_Anon_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC018, "TLS_ECDH_Anon_WITH_AES_128_CBC_SHA"),
    suite(0xC019, "TLS_ECDH_Anon_WITH_AES_256_CBC_SHA"),
    suite(0xC01A, "TLS_SRP_SHA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC01B, "TLS_SRP_SHA_RSA_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC01C, "TLS_SRP_SHA_DSS_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC01D, "TLS_SRP_SHA_WITH_AES_128_CBC_SHA"),
    suite(0xC01E, "TLS_SRP_SHA_RSA_WITH_AES_128_CBC_SHA"),
    suite(0xC01F, "TLS_SRP_SHA_DSS_WITH_AES_128_CBC_SHA"),
    suite(0xC020, "TLS_SRP_SHA_WITH_AES_256_CBC_SHA"),
    suite(0xC021, "TLS_SRP_SHA_RSA_WITH_AES_256_CBC_SHA"),
    suite(0xC022, "TLS_SRP_SHA_DSS_WITH_AES_256_CBC_SHA"),
    suite(0xC023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256"),
    suite(0xC024, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384"),
    suite(0xC025, "TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA256"),
    suite(0xC026, "TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA384"),
    suite(0xC027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"),
    suite(0xC028, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384"),
    suite(0xC029, "TLS_ECDH_RSA_WITH_AES_128_CBC_SHA256"),
    suite(0xC02A, "TLS_ECDH_RSA_WITH_AES_256_CBC_SHA384"),
    suite(0xC02B, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
    suite(0xC02C, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"),
    suite(0xC02D, "TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256"),
    suite(0xC02E, "TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384"),
    suite(0xC02F, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
    suite(0xC030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"),
    suite(0xC031, "TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256"),
    suite(0xC032, "TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384"),
    suite(0xC033, "TLS_ECDHE_PSK_WITH_RC4_128_SHA"),
    suite(0xC034, "TLS_ECDHE_PSK_WITH_3DES_EDE_CBC_SHA"),
    suite(0xC035, "TLS_ECDHE_PSK_WITH_AES_128_CBC_SHA"),
    suite(0xC036, "TLS_ECDHE_PSK_WITH_AES_256_CBC_SHA"),
    suite(0xC037, "TLS_ECDHE_PSK_WITH_AES_128_CBC_SHA256"),
    suite(0xC038, "TLS_ECDHE_PSK_WITH_AES_256_CBC_SHA384"),
    suite(0xC039, "TLS_ECDHE_PSK_WITH_NULL_SHA"),
    suite(0xC03A, "TLS_ECDHE_PSK_WITH_NULL_SHA256"),
    suite(0xC03B, "TLS_ECDHE_PSK_WITH_NULL_SHA384"),
    suite(0xFEFE, "SSL_RSA_FIPS_WITH_DES_CBC_SHA"),
    suite(0xFEFF, "SSL_RSA_FIPS_WITH_3DES_EDE_CBC_SHA"),
    suite(0xFFE0, "SSL_RSA_FIPS_WITH_3DES_EDE_CBC_SHA"),
];

/// Ordered, immutable list of the suites offered in the ClientHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherSuiteCatalog {
    ids: Vec<u16>,
}

impl Default for CipherSuiteCatalog {
    fn default() -> Self {
        Self {
            ids: DEFAULT_CIPHER_SUITES.iter().map(|s| s.id).collect(),
        }
    }
}

impl CipherSuiteCatalog {
    pub fn from_ids(ids: Vec<u16>) -> Result<Self, EncodingError> {
        if ids.is_empty() {
            return Err(EncodingError::EmptyCatalog);
        }
        if ids.len() > MAX_CIPHER_SUITES {
            return Err(EncodingError::CatalogTooLarge(ids.len()));
        }
        Ok(Self { ids })
    }

    /// Parses one suite per line. Accepted forms are `0xC02F`, `C02F` and
    /// `0xC0, 0x2F`; anything after the code is ignored, as are `#` comments
    /// and blank lines.
    pub fn parse(text: &str) -> Result<Self, EncodingError> {
        let mut ids = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let id = parse_suite_id(line).ok_or_else(|| EncodingError::InvalidCatalogEntry {
                line: idx + 1,
                text: raw.trim().to_string(),
            })?;
            ids.push(id);
        }
        Self::from_ids(ids)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot open cipher-suite catalog {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("invalid cipher-suite catalog {}", path.display()))
    }

    pub fn ids(&self) -> &[u16] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn parse_suite_id(line: &str) -> Option<u16> {
    let mut tokens = line.split_whitespace();
    let code = tokens.next()?;
    match code.split_once(',') {
        Some((hi, lo)) => {
            let lo = if lo.is_empty() { tokens.next()? } else { lo };
            let hi = u8::from_str_radix(strip_hex_prefix(hi), 16).ok()?;
            let lo = u8::from_str_radix(strip_hex_prefix(lo), 16).ok()?;
            Some(u16::from_be_bytes([hi, lo]))
        }
        None => u16::from_str_radix(strip_hex_prefix(code), 16).ok(),
    }
}

fn strip_hex_prefix(token: &str) -> &str {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_catalog_matches_table() {
        let catalog = CipherSuiteCatalog::default();
        assert_eq!(catalog.len(), 211);
        assert_eq!(catalog.ids()[0], 0x0000);
        assert_eq!(*catalog.ids().last().unwrap(), 0xFFE0);
        assert!(catalog.ids().contains(&0xC02F));
    }

    #[test]
    fn parses_all_line_forms() {
        let text = "# preferred first\n0xC02F TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256\n\nc030\n0x00, 0x2F  # TLS_RSA_WITH_AES_128_CBC_SHA\n";
        let catalog = CipherSuiteCatalog::parse(text).unwrap();
        assert_eq!(catalog.ids(), &[0xC02F, 0xC030, 0x002F]);
    }

    #[test]
    fn reports_bad_line_number() {
        let err = CipherSuiteCatalog::parse("0xC02F\nnot-a-suite\n").unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidCatalogEntry {
                line: 2,
                text: "not-a-suite".into()
            }
        );
    }

    #[test]
    fn rejects_empty_and_oversized_catalogs() {
        assert_eq!(
            CipherSuiteCatalog::parse("# nothing\n").unwrap_err(),
            EncodingError::EmptyCatalog
        );
        assert_eq!(
            CipherSuiteCatalog::from_ids(vec![0; MAX_CIPHER_SUITES + 1]).unwrap_err(),
            EncodingError::CatalogTooLarge(MAX_CIPHER_SUITES + 1)
        );
        assert!(CipherSuiteCatalog::from_ids(vec![0; MAX_CIPHER_SUITES]).is_ok());
    }

    #[test]
    fn loads_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x00, 0x35").unwrap();
        writeln!(file, "0x0A").unwrap();
        let catalog = CipherSuiteCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.ids(), &[0x0035, 0x000A]);
    }
}
