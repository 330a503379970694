use num_bigint::{BigInt, Sign};
use rayon::prelude::*;

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::poly::CoeffPoly;
use crate::ring::rns::RnsPoly;
use crate::bfv::{BfvCiphertext, check_same_context};
use crate::bfv::encoding::encode_broadcast;
use crate::bfv::encrypt::scale_plaintext;
use crate::bfv::keygen::{GaloisKey, GaloisKeys, RelinKey, trace_galois_elements};
use crate::bfv::keyswitch::{key_switch, relinearize};

/// Homomorphic addition: ct_out = ct1 + ct2.
/// Component-wise addition of ciphertext polynomials.
pub fn bfv_add(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
    check_same_context(&ct1.params, &ct2.params)?;
    let max_len = ct1.c.len().max(ct2.c.len());
    let mut c = Vec::with_capacity(max_len);

    for i in 0..max_len {
        match (ct1.c.get(i), ct2.c.get(i)) {
            (Some(a), Some(b)) => c.push(a.add(b)?),
            (Some(a), None) => c.push(a.clone()),
            (None, Some(b)) => c.push(b.clone()),
            (None, None) => unreachable!(),
        }
    }

    Ok(BfvCiphertext {
        c,
        params: ct1.params.clone(),
    })
}

/// Homomorphic subtraction: ct_out = ct1 - ct2.
pub fn bfv_sub(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
    bfv_add(ct1, &bfv_neg(ct2))
}

/// Negate a ciphertext.
pub fn bfv_neg(ct: &BfvCiphertext) -> BfvCiphertext {
    let c = ct.c.iter().map(|ci| ci.neg()).collect();
    BfvCiphertext {
        c,
        params: ct.params.clone(),
    }
}

/// Multiply every slot by the integer `scalar` (taken mod t).
pub fn bfv_mul_scalar(ct: &BfvCiphertext, scalar: u64) -> BfvCiphertext {
    let s = scalar % ct.params.plain_modulus;
    let c = ct.c.iter().map(|ci| ci.scalar_mul(s)).collect();
    BfvCiphertext {
        c,
        params: ct.params.clone(),
    }
}

/// ct + pt, slot-wise.
pub fn bfv_add_plain(ct: &BfvCiphertext, plaintext: &CoeffPoly) -> Result<BfvCiphertext, SchemeError> {
    let mut c = ct.c.clone();
    let first = c.first_mut().ok_or_else(|| {
        SchemeError::InvalidParam("ciphertext has no components".into())
    })?;
    *first = first.add(&scale_plaintext(plaintext, &ct.params)?)?;
    Ok(BfvCiphertext {
        c,
        params: ct.params.clone(),
    })
}

/// Per-slot 1 - x.
pub fn bfv_complement(ct: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
    bfv_add_plain(&bfv_neg(ct), &encode_broadcast(1, &ct.params))
}

/// Homomorphic multiplication followed by relinearization.
pub fn bfv_mul_and_relin(
    ct1: &BfvCiphertext,
    ct2: &BfvCiphertext,
    rlk: &RelinKey,
) -> Result<BfvCiphertext, SchemeError> {
    let ct_mul = bfv_mul_no_relin(ct1, ct2)?;
    relinearize(&ct_mul, rlk)
}

/// Tensor product of two degree-1 ciphertexts, scaled by t/Q.
///
/// For ct1 = (c0, c1), ct2 = (d0, d1):
///   - out_0 = ⌊t/Q · c0·d0⌉
///   - out_1 = ⌊t/Q · (c0·d1 + c1·d0)⌉
///   - out_2 = ⌊t/Q · c1·d1⌉
///
/// Components are lifted to centered integers and multiplied in Q ∪ P,
/// which holds the exact integer products, before rounding back into Q.
pub fn bfv_mul_no_relin(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
    check_same_context(&ct1.params, &ct2.params)?;
    if ct1.c.len() != 2 || ct2.c.len() != 2 {
        return Err(SchemeError::InvalidParam(
            "multiplication expects degree-1 ciphertexts".into(),
        ));
    }
    let params = &ct1.params;
    let ext = &params.ext_basis;

    let lift = |p: &RnsPoly| RnsPoly::from_bigints(&p.to_centered_bigints(&params.ct_basis), ext);
    let (a0, a1) = (lift(&ct1.c[0])?, lift(&ct1.c[1])?);
    let (b0, b1) = (lift(&ct2.c[0])?, lift(&ct2.c[1])?);

    let e0 = a0.mul(&b0)?;
    let e1 = a0.mul(&b1)?.add(&a1.mul(&b0)?)?;
    let e2 = a1.mul(&b1)?;

    let c = [e0, e1, e2].iter()
        .map(|e| scale_round(e, params))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BfvCiphertext {
        c,
        params: params.clone(),
    })
}

/// ⌊t·x/Q⌉ for a polynomial given in the extended basis, reduced into Q.
fn scale_round(poly: &RnsPoly, params: &BfvParams) -> Result<RnsPoly, SchemeError> {
    let q = BigInt::from(params.ct_basis.product().clone());
    let half_q: BigInt = &q >> 1u32;
    let t = params.plain_modulus;

    let rounded: Vec<BigInt> = poly.to_centered_bigints(&params.ext_basis)
        .into_par_iter()
        .map(|x| {
            let num = x * t;
            if num.sign() == Sign::Minus {
                -((-num + &half_q) / &q)
            } else {
                (num + &half_q) / &q
            }
        })
        .collect();

    RnsPoly::from_bigints(&rounded, &params.ct_basis)
}

/// Apply X → X^g and switch the key back from s(X^g) to s.
///
/// Slot values are permuted; the multiset of slots is unchanged.
pub fn bfv_apply_galois(ct: &BfvCiphertext, gk: &GaloisKey) -> Result<BfvCiphertext, SchemeError> {
    check_same_context(&ct.params, &gk.key.params)?;
    if ct.c.len() != 2 {
        return Err(SchemeError::InvalidParam(
            "galois automorphisms expect degree-1 ciphertexts".into(),
        ));
    }
    let c0 = ct.c[0].automorphism(gk.element);
    let c1 = ct.c[1].automorphism(gk.element);
    let (d0, d1) = key_switch(&c1, &gk.key)?;

    Ok(BfvCiphertext {
        c: vec![c0.add(&d0)?, d1],
        params: ct.params.clone(),
    })
}

/// Rotate-and-sum over the whole Galois group: afterwards every slot holds
/// the sum of all slots of `ct` (mod t).
pub fn bfv_cumulative_add(ct: &BfvCiphertext, keys: &GaloisKeys) -> Result<BfvCiphertext, SchemeError> {
    let mut acc = ct.clone();
    for element in trace_galois_elements(ct.params.ring_degree) {
        let rotated = bfv_apply_galois(&acc, keys.get(element)?)?;
        acc = bfv_add(&acc, &rotated)?;
    }
    Ok(acc)
}
