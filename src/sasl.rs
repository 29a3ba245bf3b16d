//! SASL PLAIN client support (RFC 4616).
//!
//! The session machine drives SASL during capability negotiation: after the
//! `sasl` capability is acked it sends `AUTHENTICATE PLAIN`, answers the
//! server's `+` challenge with the base64 PLAIN payload, and finishes on the
//! 90x numerics. Payloads longer than one AUTHENTICATE line are split into
//! 400-byte chunks per the IRCv3 SASL specification.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Maximum base64 payload per AUTHENTICATE line.
pub const AUTHENTICATE_CHUNK: usize = 400;

/// Encode credentials for the PLAIN mechanism.
///
/// The payload is `authzid NUL authcid NUL password` with an empty authzid,
/// which is what IRC networks expect.
pub fn encode_plain(username: &str, password: &str) -> String {
    let payload = format!("\0{}\0{}", username, password);
    BASE64.encode(payload.as_bytes())
}

/// Split an encoded payload into AUTHENTICATE argument chunks.
///
/// Every returned string fits on one AUTHENTICATE line. When the payload is
/// an exact multiple of the chunk size (or empty), a final `"+"` chunk marks
/// the end, as the specification requires.
pub fn chunk_payload(encoded: &str) -> Vec<String> {
    if encoded.is_empty() {
        return vec!["+".to_string()];
    }

    let bytes = encoded.as_bytes();
    let mut chunks: Vec<String> = bytes
        .chunks(AUTHENTICATE_CHUNK)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();

    if bytes.len() % AUTHENTICATE_CHUNK == 0 {
        chunks.push("+".to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain() {
        let encoded = encode_plain("testuser", "testpass");
        let decoded = BASE64.decode(&encoded).unwrap();
        assert_eq!(decoded, b"\0testuser\0testpass");
    }

    #[test]
    fn test_chunk_short_payload() {
        let chunks = chunk_payload("AGZvbwBiYXI=");
        assert_eq!(chunks, vec!["AGZvbwBiYXI=".to_string()]);
    }

    #[test]
    fn test_chunk_exact_multiple_appends_plus() {
        let payload = "A".repeat(AUTHENTICATE_CHUNK);
        let chunks = chunk_payload(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), AUTHENTICATE_CHUNK);
        assert_eq!(chunks[1], "+");
    }

    #[test]
    fn test_chunk_long_payload() {
        let payload = "B".repeat(AUTHENTICATE_CHUNK + 10);
        let chunks = chunk_payload(&payload);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 10);
    }

    #[test]
    fn test_chunk_empty() {
        assert_eq!(chunk_payload(""), vec!["+".to_string()]);
    }
}
