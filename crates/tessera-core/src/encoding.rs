//! Base32 and CRC-32 used by the publication code format
use crate::error::{Result, TesseraError};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const CRC32_TABLE: [u32; 256] = crc32_table();

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// CRC-32 (ISO-HDLC, as used by zlib and PNG)
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in data {
        crc = CRC32_TABLE[((crc ^ u32::from(b)) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

/// RFC 4648 base32 without padding
pub fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &b in data {
        buffer = ((buffer << 8) | u32::from(b)) & 0xFFFF;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

/// Strict inverse of [`base32_encode`]: upper-case only, no padding, and the
/// unused trailing bits must be zero so that every byte string has exactly
/// one accepted encoding.
pub fn base32_decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.bytes() {
        let v = match c {
            b'A'..=b'Z' => c - b'A',
            b'2'..=b'7' => c - b'2' + 26,
            _ => {
                return Err(TesseraError::format(format!(
                    "invalid base32 character {:?}",
                    c as char
                )))
            }
        };
        buffer = ((buffer << 5) | u32::from(v)) & 0xFFFF;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xFF) as u8);
        }
    }
    if bits >= 5 {
        return Err(TesseraError::format("base32 input has a dangling character"));
    }
    if buffer & ((1 << bits) - 1) != 0 {
        return Err(TesseraError::format("base32 input has non-zero trailing bits"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_rfc4648_vectors() {
        let vectors = [
            ("", ""),
            ("f", "MY"),
            ("fo", "MZXQ"),
            ("foo", "MZXW6"),
            ("foob", "MZXW6YQ"),
            ("fooba", "MZXW6YTB"),
            ("foobar", "MZXW6YTBOI"),
        ];
        for (plain, encoded) in vectors {
            assert_eq!(base32_encode(plain.as_bytes()), encoded, "encode {plain:?}");
            assert_eq!(base32_decode(encoded).unwrap(), plain.as_bytes(), "decode {encoded:?}");
        }
    }

    #[test]
    fn test_decode_rejects_non_canonical() {
        assert!(base32_decode("my").is_err());
        assert!(base32_decode("MY=").is_err());
        assert!(base32_decode("M1").is_err());
        // "MZ" carries a set bit after the last full byte
        assert!(base32_decode("MZ").is_err());
        // a single character cannot encode a byte
        assert!(base32_decode("MZXW6YTBO").is_err());
    }
}
