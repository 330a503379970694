use std::sync::Arc;
use num_bigint::BigUint;
use num_traits::{Signed, ToPrimitive};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::modular::{mod_add, mod_mul};
use crate::ring::poly::CoeffPoly;
use crate::ring::rns::RnsPoly;
use crate::bfv::{BfvCiphertext, check_same_context, keygen::{SecretKey, PublicKey}};
use crate::sampling::{sample_binary, sample_gaussian};

/// Encrypt a plaintext polynomial using the public key.
///
/// ct = (pk0·u + e1 + ⌊Q·m/t⌉, pk1·u + e2)
/// where u is binary and e1, e2 are Gaussian errors.
pub fn encrypt_pk(plaintext: &CoeffPoly, pk: &PublicKey) -> Result<BfvCiphertext, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    encrypt_pk_with_rng(plaintext, pk, &mut rng)
}

/// Encrypt with provided RNG (for deterministic testing).
pub fn encrypt_pk_with_rng<R: rand::Rng>(
    plaintext: &CoeffPoly,
    pk: &PublicKey,
    rng: &mut R,
) -> Result<BfvCiphertext, SchemeError> {
    let params = &pk.params;
    let basis = &params.ct_basis;
    let n = params.ring_degree;

    let scaled_m = scale_plaintext(plaintext, params)?;

    let u = RnsPoly::from_signed(&sample_binary(n, rng), basis)?;
    let e1 = RnsPoly::from_signed(&sample_gaussian(n, params.sigma, rng), basis)?;
    let e2 = RnsPoly::from_signed(&sample_gaussian(n, params.sigma, rng), basis)?;

    let c0 = pk.pk0.mul(&u)?.add(&e1)?.add(&scaled_m)?;
    let c1 = pk.pk1.mul(&u)?.add(&e2)?;

    Ok(BfvCiphertext {
        c: vec![c0, c1],
        params: params.clone(),
    })
}

/// Decrypt a BFV ciphertext of any degree.
///
/// m = ⌊t · (c0 + c1·s + c2·s² + ...) / Q⌉ mod t
pub fn decrypt(ct: &BfvCiphertext, sk: &SecretKey) -> Result<CoeffPoly, SchemeError> {
    let params = &ct.params;
    let basis = &params.ct_basis;
    let phase = phase(ct, sk)?;

    let t = params.plain_modulus;
    let t_big = BigUint::from(t);
    let half_q: BigUint = basis.product() >> 1u32;
    let limbs = phase.to_limbs();

    let coeffs = (0..params.ring_degree)
        .into_par_iter()
        .map(|j| {
            let residues: Vec<u64> = limbs.iter().map(|limb| limb[j]).collect();
            let x = basis.reconstruct(&residues);
            let scaled = (x * &t_big + &half_q) / basis.product();
            (scaled % &t_big).to_u64().unwrap_or_default()
        })
        .collect();

    Ok(CoeffPoly { coeffs, modulus: t })
}

/// Invariant noise budget in bits: log2 Q - log2 ‖t·phase mod Q‖ - 1.
///
/// Decryption is correct while this is positive.
pub fn noise_budget(ct: &BfvCiphertext, sk: &SecretKey) -> Result<u32, SchemeError> {
    let params = &ct.params;
    let basis = &params.ct_basis;
    let phase = phase(ct, sk)?;
    let t = params.plain_modulus;
    let limbs = phase.to_limbs();

    let max_bits = (0..params.ring_degree)
        .into_par_iter()
        .map(|j| {
            let residues: Vec<u64> = limbs.iter().map(|limb| limb[j]).collect();
            let v = (basis.reconstruct(&residues) * t) % basis.product();
            basis.center(v).abs().bits()
        })
        .max()
        .unwrap_or(0) as u32;

    Ok(basis.bits().saturating_sub(max_bits + 1))
}

/// c0 + c1·s + c2·s² + ...
fn phase(ct: &BfvCiphertext, sk: &SecretKey) -> Result<RnsPoly, SchemeError> {
    check_same_context(&ct.params, &sk.params)?;
    let (first, rest) = ct.c.split_first().ok_or_else(|| {
        SchemeError::InvalidParam("ciphertext has no components".into())
    })?;

    let mut phase = first.clone();
    let mut s_power = sk.poly.clone();
    for (i, c_i) in rest.iter().enumerate() {
        phase = phase.add(&c_i.mul(&s_power)?)?;
        if i + 1 < rest.len() {
            s_power = s_power.mul(&sk.poly)?;
        }
    }
    Ok(phase)
}

/// ⌊Q·m/t⌉ in RNS-NTT form, computed as Δ·m + ⌊(Q mod t)·m/t⌉ with Δ = ⌊Q/t⌋.
pub(crate) fn scale_plaintext(plaintext: &CoeffPoly, params: &Arc<BfvParams>) -> Result<RnsPoly, SchemeError> {
    let basis = &params.ct_basis;
    let t = params.plain_modulus;
    if plaintext.len() != params.ring_degree {
        return Err(SchemeError::DimensionMismatch {
            expected: params.ring_degree,
            got: plaintext.len(),
        });
    }
    if plaintext.modulus != t {
        return Err(SchemeError::ModulusMismatch);
    }

    let carries: Vec<u64> = plaintext.coeffs.iter()
        .map(|&m| ((params.q_mod_t as u128 * m as u128 + (t / 2) as u128) / t as u128) as u64)
        .collect();

    let limbs: Vec<Vec<u64>> = basis.moduli.iter()
        .enumerate()
        .map(|(i, &q)| {
            let (delta, bk) = (params.delta[i], basis.barrett_ks[i]);
            plaintext.coeffs.iter()
                .zip(&carries)
                .map(|(&m, &carry)| mod_add(mod_mul(m % q, delta, q, bk), carry % q, q))
                .collect()
        })
        .collect();

    Ok(RnsPoly::from_limbs(limbs, basis))
}
