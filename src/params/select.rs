//! Parameter selection for a target string length and security level.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParameterError;
use crate::params::{BfvParams, SecurityLevel};

/// Widest plaintext modulus the scheme represents.
pub const MAX_PLAINTEXT_MODULUS_BITS: u32 = 60;
/// Narrowest plaintext modulus; 2^16 + 1 is the only NTT-friendly prime of
/// this size for the largest ring.
pub const MIN_PLAINTEXT_MODULUS_BITS: u32 = 17;
pub const MAX_RING_DIMENSION: usize = 32768;
/// Bits per character in the default encoding.
pub const DEFAULT_CHAR_LENGTH: usize = 16;
/// Upper bound on search iterations, independent of the starting point.
pub const MAX_RING_DOUBLINGS: u32 = 8;

/// Scheme parameters chosen for a matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeParameters {
    pub ring_dimension: usize,
    pub plaintext_modulus_bits: u32,
    pub security_level: SecurityLevel,
}

/// Select parameters for strings of up to `max_string_length` characters of
/// [`DEFAULT_CHAR_LENGTH`] bits.
pub fn select(
    max_string_length: usize,
    security_level: SecurityLevel,
    force_minimum_ring: bool,
) -> Result<SchemeParameters, ParameterError> {
    select_with_char_length(max_string_length, DEFAULT_CHAR_LENGTH, security_level, force_minimum_ring)
}

pub fn select_with_char_length(
    max_string_length: usize,
    char_length: usize,
    security_level: SecurityLevel,
    force_minimum_ring: bool,
) -> Result<SchemeParameters, ParameterError> {
    select_context(max_string_length, char_length, security_level, force_minimum_ring)
        .map(|(params, _)| params)
}

/// Like [`select_with_char_length`], also returning the generated context.
pub(crate) fn select_context(
    max_string_length: usize,
    char_length: usize,
    security_level: SecurityLevel,
    force_minimum_ring: bool,
) -> Result<(SchemeParameters, Arc<BfvParams>), ParameterError> {
    if max_string_length == 0 {
        return Err(ParameterError::InvalidStringLength);
    }

    let bit_length = max_string_length as u128 * char_length.max(1) as u128;
    let plaintext_modulus_bits = plaintext_modulus_bits(bit_length)?;
    let start = starting_ring_dimension(max_string_length, security_level, force_minimum_ring);
    debug!(
        max_string_length,
        plaintext_modulus_bits,
        start,
        security = security_level.bits(),
        "searching ring dimension"
    );

    let (ring_dimension, context) = search_ring_dimension(start, plaintext_modulus_bits, |n| {
        match BfvParams::generate(n, plaintext_modulus_bits, security_level) {
            Ok(params) => Some((params.noise_budget_bits(), params)),
            Err(err) => {
                debug!(ring_dimension = n, %err, "context generation failed");
                None
            }
        }
    })?;

    Ok((
        SchemeParameters {
            ring_dimension,
            plaintext_modulus_bits,
            security_level,
        },
        context,
    ))
}

/// max(17, 2·⌈log2 bit_length⌉), bounded by [`MAX_PLAINTEXT_MODULUS_BITS`].
fn plaintext_modulus_bits(bit_length: u128) -> Result<u32, ParameterError> {
    let ceil_log2 = if bit_length <= 1 {
        0
    } else {
        u128::BITS - (bit_length - 1).leading_zeros()
    };
    let bits = (2 * ceil_log2).max(MIN_PLAINTEXT_MODULUS_BITS);
    if bits > MAX_PLAINTEXT_MODULUS_BITS {
        return Err(ParameterError::ModulusTooLarge {
            bits,
            max: MAX_PLAINTEXT_MODULUS_BITS,
        });
    }
    Ok(bits)
}

fn starting_ring_dimension(
    max_string_length: usize,
    security_level: SecurityLevel,
    force_minimum_ring: bool,
) -> usize {
    let baseline = security_level.baseline_ring_dimension();
    if force_minimum_ring {
        return baseline;
    }
    max_string_length
        .saturating_mul(2)
        .checked_next_power_of_two()
        .unwrap_or(MAX_RING_DIMENSION)
        .clamp(baseline, MAX_RING_DIMENSION)
}

/// Double the ring dimension from `start` until `measure` reports a noise
/// budget exceeding twice the plaintext modulus width.
///
/// `measure` returns `None` when no context exists for a ring dimension,
/// which counts as an insufficient budget.
pub fn search_ring_dimension<T, F>(
    start: usize,
    plaintext_modulus_bits: u32,
    mut measure: F,
) -> Result<(usize, T), ParameterError>
where
    F: FnMut(usize) -> Option<(u32, T)>,
{
    let required = 2 * i64::from(plaintext_modulus_bits);
    let mut ring_dimension = start.max(1);

    for _ in 0..=MAX_RING_DOUBLINGS {
        if ring_dimension > MAX_RING_DIMENSION {
            break;
        }
        if let Some((budget, context)) = measure(ring_dimension) {
            if i64::from(budget) - required > 0 {
                debug!(ring_dimension, budget, required, "ring dimension accepted");
                return Ok((ring_dimension, context));
            }
            debug!(ring_dimension, budget, required, "noise budget too small, doubling");
        }
        ring_dimension = ring_dimension.saturating_mul(2);
    }

    Err(ParameterError::RingTooLarge {
        ring_dimension,
        max: MAX_RING_DIMENSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_modulus_bits() {
        assert_eq!(plaintext_modulus_bits(1), Ok(17));
        assert_eq!(plaintext_modulus_bits(256), Ok(17));
        // 257 bits -> ⌈log2⌉ = 9 -> 18
        assert_eq!(plaintext_modulus_bits(257), Ok(18));
        assert_eq!(plaintext_modulus_bits(4096), Ok(24));
        assert_eq!(plaintext_modulus_bits(1 << 30), Ok(60));
        assert_eq!(
            plaintext_modulus_bits((1 << 30) + 1),
            Err(ParameterError::ModulusTooLarge { bits: 62, max: 60 })
        );
    }

    #[test]
    fn test_starting_ring_dimension() {
        assert_eq!(starting_ring_dimension(256, SecurityLevel::Bits128, true), 4096);
        assert_eq!(starting_ring_dimension(256, SecurityLevel::Bits256, true), 8192);
        assert_eq!(starting_ring_dimension(256, SecurityLevel::Bits128, false), 4096);
        assert_eq!(starting_ring_dimension(5000, SecurityLevel::Bits128, false), 16384);
        assert_eq!(starting_ring_dimension(1 << 20, SecurityLevel::Bits192, false), 32768);
        assert_eq!(starting_ring_dimension(usize::MAX, SecurityLevel::Bits128, false), 32768);
    }

    #[test]
    fn test_search_accepts_first_sufficient_ring() {
        let mut seen = Vec::new();
        let result = search_ring_dimension(4096, 24, |n| {
            seen.push(n);
            Some((if n >= 16384 { 49 } else { 48 }, n))
        });
        assert_eq!(result, Ok((16384, 16384)));
        assert_eq!(seen, vec![4096, 8192, 16384]);
    }

    #[test]
    fn test_search_treats_missing_context_as_insufficient() {
        let result = search_ring_dimension(4096, 17, |n| (n != 4096).then_some((100, ())));
        assert_eq!(result, Ok((8192, ())));
    }

    #[test]
    fn test_search_terminates_past_ceiling() {
        let mut calls = 0;
        let result = search_ring_dimension(4096, 17, |_| {
            calls += 1;
            Some((0, ()))
        });
        assert_eq!(
            result,
            Err(ParameterError::RingTooLarge { ring_dimension: 65536, max: MAX_RING_DIMENSION })
        );
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_search_is_bounded_from_tiny_start() {
        let result = search_ring_dimension(1, 17, |_| None::<(u32, ())>);
        assert!(matches!(result, Err(ParameterError::RingTooLarge { .. })));
    }

    #[test]
    fn test_select_defaults() {
        let params = select(256, SecurityLevel::Bits128, true).unwrap();
        assert_eq!(
            params,
            SchemeParameters {
                ring_dimension: 4096,
                plaintext_modulus_bits: 24,
                security_level: SecurityLevel::Bits128,
            }
        );
    }

    #[test]
    fn test_select_doubles_for_192() {
        // 75 - 24 - 14 = 37 is not above 2·24, 8192 gives 152 - 26 - 14 = 112.
        let params = select(256, SecurityLevel::Bits192, true).unwrap();
        assert_eq!(params.ring_dimension, 8192);
    }

    #[test]
    fn test_select_256_starts_at_8192() {
        let params = select(256, SecurityLevel::Bits256, true).unwrap();
        assert_eq!(params.ring_dimension, 8192);
        assert_eq!(params.plaintext_modulus_bits, 24);
    }

    #[test]
    fn test_select_rejects_bad_input() {
        assert_eq!(select(0, SecurityLevel::Bits128, true), Err(ParameterError::InvalidStringLength));
        assert_eq!(
            select(1 << 27, SecurityLevel::Bits128, true),
            Err(ParameterError::ModulusTooLarge { bits: 62, max: 60 })
        );
    }

    #[test]
    fn test_select_with_narrow_characters() {
        // 256 chars of 8 bits = 2048 bits -> 22-bit modulus
        let params = select_with_char_length(256, 8, SecurityLevel::Bits128, true).unwrap();
        assert_eq!(params.plaintext_modulus_bits, 22);
    }

    #[test]
    fn test_parameters_serialize_level_as_integer() {
        let params = select(256, SecurityLevel::Bits128, true).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"ring_dimension":4096,"plaintext_modulus_bits":24,"security_level":128}"#);
        let back: SchemeParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
