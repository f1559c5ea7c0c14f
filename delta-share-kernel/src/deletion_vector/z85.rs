//! Z85, the Base85 variant Delta uses to embed deletion-vector UUIDs in paths.
//!
//! Every 4 bytes map to 5 characters, big-endian. A UUID encodes to exactly
//! [`ENCODED_UUID_LENGTH`] characters.

use uuid::Uuid;

use crate::error::{Result, SharingError};

const ALPHABET: &[u8; 85] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.-:+=^!/*?&<>()[]{}@%$#";

const INVALID: u8 = 0xFF;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encoded length of a 16-byte UUID.
pub const ENCODED_UUID_LENGTH: usize = 20;

/// Decode Z85 text. The length must be a multiple of 5.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let bytes = encoded.as_bytes();
    if bytes.len() % 5 != 0 {
        return Err(SharingError::deletion_vector(format!(
            "Z85 input length {} is not a multiple of 5",
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(bytes.len() / 5 * 4);
    for chunk in bytes.chunks_exact(5) {
        let mut value: u64 = 0;
        for &c in chunk {
            let digit = DECODE_TABLE[c as usize];
            if digit == INVALID {
                return Err(SharingError::deletion_vector(format!(
                    "invalid Z85 character {:?}",
                    c as char
                )));
            }
            value = value * 85 + u64::from(digit);
        }
        let word = u32::try_from(value).map_err(|_| {
            SharingError::deletion_vector(format!(
                "Z85 group {:?} overflows 32 bits",
                String::from_utf8_lossy(chunk)
            ))
        })?;
        out.extend_from_slice(&word.to_be_bytes());
    }
    Ok(out)
}

/// Encode bytes as Z85. The length must be a multiple of 4.
pub fn encode(data: &[u8]) -> Result<String> {
    if data.len() % 4 != 0 {
        return Err(SharingError::deletion_vector(format!(
            "Z85 input length {} is not a multiple of 4",
            data.len()
        )));
    }

    Ok(encode_words(data))
}

/// Decode a 20-character Z85 UUID.
pub fn decode_uuid(encoded: &str) -> Result<Uuid> {
    if encoded.len() != ENCODED_UUID_LENGTH {
        return Err(SharingError::deletion_vector(format!(
            "encoded UUID must be {} characters, got {}",
            ENCODED_UUID_LENGTH,
            encoded.len()
        )));
    }
    let bytes = decode(encoded)?;
    Uuid::from_slice(&bytes).map_err(|e| SharingError::deletion_vector(e.to_string()))
}

/// Encode a UUID as 20 Z85 characters.
pub fn encode_uuid(uuid: &Uuid) -> String {
    encode_words(uuid.as_bytes())
}

fn encode_words(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / 4 * 5);
    for chunk in data.chunks_exact(4) {
        let mut value = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let mut digits = [0u8; 5];
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        out.extend(digits.iter().map(|&d| d as char));
    }
    out
}
