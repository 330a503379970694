//! Security levels and the coefficient-modulus sizes that achieve them.
//!
//! Total bit counts follow the HomomorphicEncryption.org standard for
//! ternary secrets with σ = 3.2 (classical attacks). Each total is split
//! into NTT-friendly primes of at most 60 bits.

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Target classical security in bits. Serializes as the plain integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SecurityLevel {
    #[default]
    Bits128,
    Bits192,
    Bits256,
}

impl SecurityLevel {
    pub fn bits(self) -> u32 {
        match self {
            SecurityLevel::Bits128 => 128,
            SecurityLevel::Bits192 => 192,
            SecurityLevel::Bits256 => 256,
        }
    }

    /// Smallest ring dimension with a standardized modulus at this level
    /// that leaves room for one multiplication.
    pub fn baseline_ring_dimension(self) -> usize {
        match self {
            SecurityLevel::Bits128 | SecurityLevel::Bits192 => 4096,
            SecurityLevel::Bits256 => 8192,
        }
    }
}

impl TryFrom<u32> for SecurityLevel {
    type Error = ParameterError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(SecurityLevel::Bits128),
            192 => Ok(SecurityLevel::Bits192),
            256 => Ok(SecurityLevel::Bits256),
            other => Err(ParameterError::UnsupportedSecurityLevel(other)),
        }
    }
}

impl From<SecurityLevel> for u32 {
    fn from(level: SecurityLevel) -> u32 {
        level.bits()
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Prime sizes of the coefficient modulus for `(ring_degree, level)`, or
/// `None` if the combination is not standardized.
pub fn coeff_modulus_bits(ring_degree: usize, level: SecurityLevel) -> Option<&'static [u32]> {
    use SecurityLevel::*;

    let bits: &'static [u32] = match (ring_degree, level) {
        (4096, Bits128) => &[36, 36, 37],
        (8192, Bits128) => &[43, 43, 44, 44, 44],
        (16384, Bits128) => &[48, 48, 48, 49, 49, 49, 49, 49, 49],
        (32768, Bits128) => &[
            55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 55, 56,
        ],
        (4096, Bits192) => &[37, 38],
        (8192, Bits192) => &[50, 51, 51],
        (16384, Bits192) => &[50, 51, 51, 51, 51, 51],
        (32768, Bits192) => &[55, 55, 55, 55, 55, 56, 56, 56, 56, 56, 56],
        (4096, Bits256) => &[58],
        (8192, Bits256) => &[59, 59],
        (16384, Bits256) => &[59, 59, 59, 60],
        (32768, Bits256) => &[59, 59, 59, 59, 60, 60, 60, 60],
        _ => return None,
    };
    Some(bits)
}

/// Largest standardized log2(Q) for `(ring_degree, level)`.
pub fn max_coeff_modulus_bits(ring_degree: usize, level: SecurityLevel) -> Option<u32> {
    coeff_modulus_bits(ring_degree, level).map(|bits| bits.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_totals() {
        let expected = [
            (4096, SecurityLevel::Bits128, 109),
            (8192, SecurityLevel::Bits128, 218),
            (16384, SecurityLevel::Bits128, 438),
            (32768, SecurityLevel::Bits128, 881),
            (4096, SecurityLevel::Bits192, 75),
            (8192, SecurityLevel::Bits192, 152),
            (16384, SecurityLevel::Bits192, 305),
            (32768, SecurityLevel::Bits192, 611),
            (4096, SecurityLevel::Bits256, 58),
            (8192, SecurityLevel::Bits256, 118),
            (16384, SecurityLevel::Bits256, 237),
            (32768, SecurityLevel::Bits256, 476),
        ];
        for (n, level, total) in expected {
            assert_eq!(max_coeff_modulus_bits(n, level), Some(total), "n={n} {level}");
            assert!(coeff_modulus_bits(n, level).unwrap().iter().all(|&b| b <= 60));
        }
    }

    #[test]
    fn test_unsupported_rings() {
        assert_eq!(coeff_modulus_bits(2048, SecurityLevel::Bits128), None);
        assert_eq!(coeff_modulus_bits(65536, SecurityLevel::Bits256), None);
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(SecurityLevel::try_from(192), Ok(SecurityLevel::Bits192));
        assert_eq!(
            SecurityLevel::try_from(100),
            Err(ParameterError::UnsupportedSecurityLevel(100))
        );
        assert_eq!(u32::from(SecurityLevel::Bits256), 256);
        assert_eq!(SecurityLevel::Bits128.to_string(), "128-bit");
    }
}
