//! Human-safe base-32 codec.
//!
//! Maps bytes to and from a 32-character alphabet with the vowels and the
//! visually ambiguous characters removed:
//!
//! ```text
//! 0123456789ABCDFGHJKLMNPQRSTVWXYZ
//! ```
//!
//! No `E`, `I`, `O`, or `U`, so encoded output can neither spell words nor
//! be misread as `0`/`1`. Keys, signatures, and digests are rendered in
//! this alphabet wherever a human might see or retype them.
//!
//! # Encoding
//!
//! MSB-first 5-bit grouping. The final partial group, if any, is padded
//! with zero bits; there are no padding characters, so an `n`-byte input
//! encodes to `⌈8n/5⌉` characters. Decoding is strict: characters outside
//! the alphabet, impossible lengths, and non-zero padding bits are all
//! refused.
//!
//! # Example
//!
//! ```
//! use keyward_codec::{decode, encode};
//!
//! let text = encode(&[0xDE, 0xAD, 0xBE, 0xEF]);
//! assert_eq!(decode(&text).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// The 32-character alphabet, in value order.
pub const ALPHABET: &[u8; 32] = b"0123456789ABCDFGHJKLMNPQRSTVWXYZ";

const INVALID: u8 = 0xFF;

/// Reverse lookup table: byte value of a character to its 5-bit value.
const LOOKUP: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Errors from strict decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A character outside the alphabet.
    #[error("invalid base-32 character {character:?} at position {position}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Its byte offset in the input.
        position: usize,
    },

    /// A length no byte sequence encodes to.
    #[error("invalid base-32 length: {length}")]
    InvalidLength {
        /// The input length in characters.
        length: usize,
    },

    /// Padding bits in the final character were not zero.
    #[error("non-zero padding bits in final base-32 character")]
    InvalidPadding,
}

/// Encode bytes into the base-32 alphabet.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[((acc >> bits) & 0x1F) as usize]));
        }
    }
    if bits > 0 {
        // Final partial group, zero-padded on the right.
        out.push(char::from(ALPHABET[((acc << (5 - bits)) & 0x1F) as usize]));
    }
    out
}

/// Decode a base-32 string back into bytes.
///
/// # Errors
///
/// - [`CodecError::InvalidCharacter`] for anything outside the alphabet
/// - [`CodecError::InvalidLength`] for lengths no encoding produces
///   (e.g. a lone trailing character carrying a whole unused group)
/// - [`CodecError::InvalidPadding`] when the zero-padding bits of the
///   final character are not zero
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for (position, byte) in text.bytes().enumerate() {
        let value = LOOKUP[byte as usize];
        if value == INVALID {
            return Err(CodecError::InvalidCharacter {
                character: char::from(byte),
                position,
            });
        }
        acc = (acc << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xFF) as u8);
        }
    }

    // A valid encoding leaves fewer than 5 trailing bits, and all zero.
    if bits >= 5 {
        return Err(CodecError::InvalidLength { length: text.len() });
    }
    if bits > 0 && (acc & ((1 << bits) - 1)) != 0 {
        return Err(CodecError::InvalidPadding);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_empty_round_trip() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").expect("decode"), Vec::<u8>::new());
    }

    #[test]
    fn test_single_byte_vectors() {
        // 0x00 = 00000 000(00) -> "00"
        assert_eq!(encode(&[0x00]), "00");
        // 0xFF = 11111 111(00) -> values 31, 28 -> "ZW"
        assert_eq!(encode(&[0xFF]), "ZW");
    }

    #[test]
    fn test_two_byte_vector() {
        // 0x00 0x01 = 00000 00000 00000 1(0000) -> values 0,0,0,16 -> "000H"
        assert_eq!(encode(&[0x00, 0x01]), "000H");
    }

    #[test]
    fn test_encoded_length_is_ceiling_of_8n_over_5() {
        for n in 0..64usize {
            let text = encode(&vec![0xA5u8; n]);
            assert_eq!(text.len(), (8 * n).div_ceil(5), "length for {n} bytes");
        }
    }

    #[test]
    fn test_alphabet_has_no_vowels_or_ambiguous_letters() {
        for forbidden in ['E', 'I', 'O', 'U'] {
            assert!(!ALPHABET.contains(&(forbidden as u8)));
        }
        assert_eq!(ALPHABET.len(), 32);
    }

    #[test]
    fn test_decode_rejects_characters_outside_the_alphabet() {
        assert_eq!(
            decode("0E"),
            Err(CodecError::InvalidCharacter {
                character: 'E',
                position: 1
            })
        );
        assert!(decode("abc").is_err());
        assert!(decode("0 1").is_err());
    }

    #[test]
    fn test_decode_rejects_impossible_length() {
        // One character carries only 5 bits: no byte sequence encodes to it.
        assert_eq!(decode("Z"), Err(CodecError::InvalidLength { length: 1 }));
    }

    #[test]
    fn test_decode_rejects_nonzero_padding() {
        // "ZZ" would decode to 0xFF with padding bits 11, not 00.
        assert_eq!(decode("ZZ"), Err(CodecError::InvalidPadding));
        assert_eq!(decode("ZW").expect("decode"), vec![0xFF]);
    }

    #[test]
    fn test_key_sized_round_trip() {
        let key = [0x42u8; 32];
        let text = encode(&key);
        assert_eq!(text.len(), 52);
        assert_eq!(decode(&text).expect("decode"), key.to_vec());
    }

    #[test]
    fn test_signature_sized_round_trip() {
        let signature: Vec<u8> = (0..64u8).collect();
        let text = encode(&signature);
        assert_eq!(text.len(), 103);
        assert_eq!(decode(&text).expect("decode"), signature);
    }
}
