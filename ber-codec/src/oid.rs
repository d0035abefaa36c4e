//! OBJECT IDENTIFIER arc encoding
//!
//! # OID Encoding Rules
//! - First two arcs (X.Y) of an absolute OID are combined as `40*X + Y`
//! - Every subidentifier is written in base-128, most significant group
//!   first, with bit 8 set on all bytes but the last of each subidentifier
//! - Relative OIDs skip the first-arc combination

use ber_core::{BerError, BerResult};
use once_cell::sync::Lazy;
use regex::Regex;

static OID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+\.){3,}[0-9]+$").expect("OID pattern is valid"));

static RELATIVE_OID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("relative OID pattern is valid"));

/// Parse a dotted absolute OID ("1.2.840.113549") into its content octets
///
/// At least four arcs are required.
pub fn encode_absolute(dotted: &str) -> BerResult<Vec<u8>> {
    if !OID_PATTERN.is_match(dotted) {
        return Err(BerError::InvalidOid(dotted.to_string()));
    }
    let arcs = parse_arcs(dotted)?;

    let first = arcs[0]
        .checked_mul(40)
        .and_then(|x| x.checked_add(arcs[1]))
        .ok_or_else(|| BerError::InvalidOid(format!("{dotted}: first arcs too large")))?;

    let mut bytes = Vec::with_capacity(arcs.len() + 4);
    encode_arc(&mut bytes, first);
    for &arc in &arcs[2..] {
        encode_arc(&mut bytes, arc);
    }
    Ok(bytes)
}

/// Parse a dotted relative OID ("8571.3.2") into its content octets
pub fn encode_relative(dotted: &str) -> BerResult<Vec<u8>> {
    if !RELATIVE_OID_PATTERN.is_match(dotted) {
        return Err(BerError::InvalidOid(dotted.to_string()));
    }
    let mut bytes = Vec::new();
    for arc in parse_arcs(dotted)? {
        encode_arc(&mut bytes, arc);
    }
    Ok(bytes)
}

/// Decode the content octets of an absolute OID into dotted form
pub fn decode_absolute(bytes: &[u8]) -> BerResult<String> {
    let mut arcs = decode_arcs(bytes)?;
    let first = arcs.remove(0);
    arcs.insert(0, first % 40);
    arcs.insert(0, first / 40);
    Ok(join(&arcs))
}

/// Decode the content octets of a relative OID into dotted form
pub fn decode_relative(bytes: &[u8]) -> BerResult<String> {
    decode_arcs(bytes).map(|arcs| join(&arcs))
}

/// Append one subidentifier in base-128 (1-5 bytes for a `u32`)
pub fn encode_arc(bytes: &mut Vec<u8>, arc: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut remaining = arc;
    loop {
        groups[count] = (remaining & 0x7F) as u8;
        count += 1;
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }

    for i in (0..count).rev() {
        if i > 0 {
            bytes.push(groups[i] | 0x80);
        } else {
            bytes.push(groups[i]);
        }
    }
}

/// Split content octets into subidentifiers
///
/// Fails on empty input, on a last byte that still has the continuation bit
/// set, and on subidentifiers that do not fit a `u32`.
pub fn decode_arcs(bytes: &[u8]) -> BerResult<Vec<u32>> {
    if bytes.is_empty() {
        return Err(BerError::InvalidAsn1("empty object identifier".to_string()));
    }

    let mut arcs = Vec::new();
    let mut value = 0u32;
    let mut pending = false;

    for &byte in bytes {
        value = value
            .checked_mul(128)
            .map(|x| x | (byte & 0x7F) as u32)
            .ok_or_else(|| BerError::InvalidAsn1("OID component overflow".to_string()))?;
        pending = byte & 0x80 != 0;
        if !pending {
            arcs.push(value);
            value = 0;
        }
    }

    if pending {
        return Err(BerError::InvalidAsn1(
            "truncated OID component".to_string(),
        ));
    }
    Ok(arcs)
}

fn parse_arcs(dotted: &str) -> BerResult<Vec<u32>> {
    dotted
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| BerError::InvalidOid(format!("{dotted}: arc {part} out of range")))
        })
        .collect()
}

fn join(arcs: &[u32]) -> String {
    arcs.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encode_arc_widths() {
        let cases: [(u32, &[u8]); 6] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x81, 0x00]),
            (16383, &[0xFF, 0x7F]),
            (16384, &[0x81, 0x80, 0x00]),
            (u32::MAX, &[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for (arc, expected) in cases {
            let mut bytes = Vec::new();
            encode_arc(&mut bytes, arc);
            assert_eq!(bytes, expected, "arc {arc}");
        }
    }

    #[test]
    fn test_encode_rsa_sha1() {
        let bytes = encode_absolute("1.2.840.113549.1.1.5").unwrap();
        assert_eq!(bytes, hex!("2a 86 48 86 f7 0d 01 01 05"));
        assert_eq!(decode_absolute(&bytes).unwrap(), "1.2.840.113549.1.1.5");
    }

    #[test]
    fn test_encode_rejects_short_or_malformed() {
        assert!(matches!(encode_absolute("1.2.840"), Err(BerError::InvalidOid(_))));
        assert!(matches!(encode_absolute("1.2.a.4"), Err(BerError::InvalidOid(_))));
        assert!(matches!(encode_absolute("1..2.3.4"), Err(BerError::InvalidOid(_))));
        assert!(matches!(encode_absolute("1.2.3.4294967296"), Err(BerError::InvalidOid(_))));
    }

    #[test]
    fn test_relative() {
        let bytes = encode_relative("8571.3.2").unwrap();
        assert_eq!(bytes, hex!("c2 7b 03 02"));
        assert_eq!(decode_relative(&bytes).unwrap(), "8571.3.2");
    }

    #[test]
    fn test_decode_truncated_component() {
        assert!(decode_arcs(&hex!("2a 86")).is_err());
        assert!(decode_arcs(&[]).is_err());
    }

    #[test]
    fn test_decode_overflow() {
        assert!(decode_arcs(&hex!("ff ff ff ff ff 7f")).is_err());
    }
}
