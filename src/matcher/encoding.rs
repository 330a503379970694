//! Fixed-width big-endian bit encoding of strings.

use crate::error::EncodingError;

const MAX_CHAR_LENGTH: usize = 32;

/// A sequence of bits, one `char_length`-bit big-endian group per character.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BinaryVector {
    bits: Vec<u8>,
}

impl BinaryVector {
    /// Wrap raw bits; every entry must be 0 or 1.
    pub fn from_bits(bits: Vec<u8>) -> Result<Self, EncodingError> {
        if let Some((index, &value)) = bits.iter().enumerate().find(|(_, b)| **b > 1) {
            return Err(EncodingError::InvalidBit { index, value: u64::from(value) });
        }
        Ok(Self { bits })
    }

    /// Build from decrypted slot values.
    pub(crate) fn from_slots(slots: &[u64]) -> Result<Self, EncodingError> {
        let bits = slots.iter()
            .enumerate()
            .map(|(index, &value)| match value {
                0 | 1 => Ok(value as u8),
                _ => Err(EncodingError::InvalidBit { index, value }),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(Self { bits })
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// Plaintext Hamming distance; `None` if the lengths differ.
    pub fn hamming_distance(&self, other: &Self) -> Option<usize> {
        (self.len() == other.len())
            .then(|| self.bits.iter().zip(&other.bits).filter(|(a, b)| a != b).count())
    }

    pub(crate) fn extend_from(&mut self, other: BinaryVector) {
        self.bits.extend(other.bits);
    }
}

fn check_char_length(char_length: usize) -> Result<(), EncodingError> {
    if (1..=MAX_CHAR_LENGTH).contains(&char_length) {
        Ok(())
    } else {
        Err(EncodingError::InvalidCharLength(char_length))
    }
}

/// Encode every code point of `text` as `char_length` big-endian bits.
pub fn encode_string(text: &str, char_length: usize) -> Result<BinaryVector, EncodingError> {
    check_char_length(char_length)?;
    let mut bits = Vec::with_capacity(text.len() * char_length);

    for character in text.chars() {
        let code = character as u32;
        if char_length < MAX_CHAR_LENGTH && code >> char_length != 0 {
            return Err(EncodingError::CharacterOutOfRange { character, code, char_length });
        }
        bits.extend((0..char_length).rev().map(|k| ((code >> k) & 1) as u8));
    }

    Ok(BinaryVector { bits })
}

/// Inverse of [`encode_string`]. The vector length must be a multiple of
/// `char_length`.
pub fn decode_string(vector: &BinaryVector, char_length: usize) -> Result<String, EncodingError> {
    check_char_length(char_length)?;
    if vector.len() % char_length != 0 {
        return Err(EncodingError::MisalignedVector { len: vector.len(), char_length });
    }

    vector.bits
        .chunks(char_length)
        .map(|group| {
            let code = group.iter().fold(0u32, |acc, &b| (acc << 1) | u32::from(b));
            char::from_u32(code).ok_or(EncodingError::InvalidCodePoint(code))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_big_endian() {
        let v = encode_string("A", 16).unwrap();
        // 'A' = 0x41
        assert_eq!(v.bits(), &[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_string("hi", 8).unwrap().len(), 16);
    }

    #[test]
    fn test_roundtrip() {
        for text in ["", "hello world", "ünïcödé", "日本語", "a\u{FFFF}"] {
            let v = encode_string(text, 16).unwrap();
            assert_eq!(v.len(), text.chars().count() * 16);
            assert_eq!(decode_string(&v, 16).unwrap(), text);
        }
        let emoji = "🦀";
        assert_eq!(decode_string(&encode_string(emoji, 21).unwrap(), 21).unwrap(), emoji);
    }

    #[test]
    fn test_character_out_of_range() {
        assert_eq!(
            encode_string("ab\u{1F980}", 16),
            Err(EncodingError::CharacterOutOfRange { character: '🦀', code: 0x1F980, char_length: 16 })
        );
        assert!(encode_string("é", 7).is_err());
        assert!(encode_string("é", 8).is_ok());
    }

    #[test]
    fn test_misaligned_decode() {
        let v = BinaryVector::from_bits(vec![0; 17]).unwrap();
        assert_eq!(
            decode_string(&v, 16),
            Err(EncodingError::MisalignedVector { len: 17, char_length: 16 })
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(encode_string("a", 0), Err(EncodingError::InvalidCharLength(0)));
        assert_eq!(encode_string("a", 33), Err(EncodingError::InvalidCharLength(33)));
        assert_eq!(
            BinaryVector::from_bits(vec![0, 1, 2]),
            Err(EncodingError::InvalidBit { index: 2, value: 2 })
        );
        // 0xD800 is a surrogate
        let surrogate = BinaryVector::from_bits((0..16).rev().map(|k| ((0xD800u32 >> k) & 1) as u8).collect()).unwrap();
        assert_eq!(decode_string(&surrogate, 16), Err(EncodingError::InvalidCodePoint(0xD800)));
    }

    #[test]
    fn test_plain_hamming_distance() {
        let a = encode_string("hello", 16).unwrap();
        let b = encode_string("hallo", 16).unwrap();
        // 'e' = 0x65, 'a' = 0x61
        assert_eq!(a.hamming_distance(&b), Some(1));
        assert_eq!(a.hamming_distance(&encode_string("hell", 16).unwrap()), None);
        assert_eq!(encode_string("\u{3}", 16).unwrap().count_ones(), 2);
    }
}
