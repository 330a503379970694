//! Batch encoding: a plaintext polynomial mod t holds n slots.
//!
//! Since t ≡ 1 (mod 2n), X^n + 1 splits completely mod t and a polynomial is
//! determined by its evaluations at the n primitive 2n-th roots of unity.
//! Those evaluations are the slots, so slot-wise products are ring products.

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;

/// Encode up to n slot values in [0, t). Missing slots are set to zero.
pub fn encode_slots(slots: &[u64], params: &BfvParams) -> Result<CoeffPoly, SchemeError> {
    let n = params.ring_degree;
    let t = params.plain_modulus;
    if slots.len() > n {
        return Err(SchemeError::DimensionMismatch { expected: n, got: slots.len() });
    }
    if let Some(&v) = slots.iter().find(|&&v| v >= t) {
        return Err(SchemeError::InvalidParam(format!("slot value {v} is not below t = {t}")));
    }

    let mut evals = vec![0u64; n];
    evals[..slots.len()].copy_from_slice(slots);
    let coeffs = NttPoly::from_evals(evals, params.plain_plan.clone()).to_coeffs();
    Ok(CoeffPoly { coeffs, modulus: t })
}

/// All n slots of a plaintext.
pub fn decode_slots(plaintext: &CoeffPoly, params: &BfvParams) -> Result<Vec<u64>, SchemeError> {
    if plaintext.len() != params.ring_degree {
        return Err(SchemeError::DimensionMismatch {
            expected: params.ring_degree,
            got: plaintext.len(),
        });
    }
    if plaintext.modulus != params.plain_modulus {
        return Err(SchemeError::ModulusMismatch);
    }
    Ok(NttPoly::from_coeffs(plaintext.coeffs.clone(), params.plain_plan.clone()).evals)
}

/// The plaintext with `value` in every slot: the constant polynomial.
pub fn encode_broadcast(value: u64, params: &BfvParams) -> CoeffPoly {
    CoeffPoly::constant(params.ring_degree, value, params.plain_modulus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::presets::compact_bfv;

    #[test]
    fn test_slots_roundtrip_with_padding() {
        let params = compact_bfv().unwrap();
        let slots = vec![1, 0, 1, 1, 7, 120832];
        let pt = encode_slots(&slots, &params).unwrap();
        let decoded = decode_slots(&pt, &params).unwrap();
        assert_eq!(&decoded[..slots.len()], &slots[..]);
        assert!(decoded[slots.len()..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_slot_products_are_ring_products() {
        let params = compact_bfv().unwrap();
        let a = encode_slots(&[1, 1, 0, 5], &params).unwrap();
        let b = encode_slots(&[1, 0, 1, 3], &params).unwrap();
        let prod = a.mul_naive(&b).unwrap();
        let decoded = decode_slots(&prod, &params).unwrap();
        assert_eq!(&decoded[..4], &[1, 0, 0, 15]);
    }

    #[test]
    fn test_broadcast() {
        let params = compact_bfv().unwrap();
        let decoded = decode_slots(&encode_broadcast(1, &params), &params).unwrap();
        assert!(decoded.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = compact_bfv().unwrap();
        assert!(encode_slots(&vec![0; 1025], &params).is_err());
        assert!(encode_slots(&[params.plain_modulus], &params).is_err());
        let wrong = CoeffPoly::zero(1024, 17);
        assert_eq!(decode_slots(&wrong, &params), Err(SchemeError::ModulusMismatch));
    }
}
