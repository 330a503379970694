use rayon::prelude::*;

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::modular::mod_mul;
use crate::ring::rns::RnsPoly;
use crate::bfv::{BfvCiphertext, check_same_context, keygen::{KeySwitchKey, RelinKey}};

/// Gadget decomposition matching `KeySwitchKey` entries.
///
/// With y_i = [x · (Q/q_i)^{-1}]_{q_i} we have x ≡ Σ_i y_i · (Q/q_i) (mod Q).
/// Each y_i is split into base-2^w digits d_{i,l}, so
/// x ≡ Σ_{i,l} d_{i,l} · (Q/q_i) · 2^{w·l}. Digits are below 2^w.
pub fn gadget_decompose(poly: &RnsPoly, params: &BfvParams) -> Vec<RnsPoly> {
    let basis = &params.ct_basis;
    let w = params.gadget_log_base as usize;
    let mask = (1u64 << w) - 1;
    let limbs = poly.to_limbs();

    let entries: Vec<(usize, usize)> = params.gadget_digits.iter()
        .enumerate()
        .flat_map(|(i, &digits)| (0..digits).map(move |l| (i, l)))
        .collect();

    entries.par_iter()
        .map(|&(i, l)| {
            let q = basis.moduli[i];
            let (inv, bk) = (basis.q_hat_inv[i], basis.barrett_ks[i]);
            let digit: Vec<u64> = limbs[i].iter()
                .map(|&c| (mod_mul(c, inv, q, bk) >> (w * l)) & mask)
                .collect();
            let digit_limbs: Vec<Vec<u64>> = basis.moduli.iter()
                .map(|&qj| digit.iter().map(|&d| d % qj).collect())
                .collect();
            RnsPoly::from_limbs(digit_limbs, basis)
        })
        .collect()
}

/// Σ_j decompose_j(x) · (ks0_j, ks1_j). If the key encrypts g_j·s' under s,
/// the result decrypts under s to x·s' plus key-switching noise.
pub fn key_switch(x: &RnsPoly, ksk: &KeySwitchKey) -> Result<(RnsPoly, RnsPoly), SchemeError> {
    let params = &ksk.params;
    let digits = gadget_decompose(x, params);
    if digits.len() != ksk.keys.len() {
        return Err(SchemeError::DimensionMismatch {
            expected: ksk.keys.len(),
            got: digits.len(),
        });
    }

    let products = digits.par_iter()
        .zip(ksk.keys.par_iter())
        .map(|(d, (k0, k1))| -> Result<(RnsPoly, RnsPoly), SchemeError> {
            Ok((d.mul(k0)?, d.mul(k1)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut acc0 = RnsPoly::zero(&params.ct_basis);
    let mut acc1 = acc0.clone();
    for (p0, p1) in &products {
        acc0 = acc0.add(p0)?;
        acc1 = acc1.add(p1)?;
    }
    Ok((acc0, acc1))
}

/// Relinearize a degree-2 ciphertext (c0, c1, c2) to degree-1 (c0', c1').
///
/// c0' = c0 + Σ_j decompose_j(c2) · rlk0_j
/// c1' = c1 + Σ_j decompose_j(c2) · rlk1_j
pub fn relinearize(ct: &BfvCiphertext, rlk: &RelinKey) -> Result<BfvCiphertext, SchemeError> {
    check_same_context(&ct.params, &rlk.key.params)?;
    match ct.c.len() {
        2 => Ok(ct.clone()),
        3 => {
            let (d0, d1) = key_switch(&ct.c[2], &rlk.key)?;
            Ok(BfvCiphertext {
                c: vec![ct.c[0].add(&d0)?, ct.c[1].add(&d1)?],
                params: ct.params.clone(),
            })
        }
        _ => Err(SchemeError::InvalidParam(
            "relinearization only supports degree-2 ciphertexts".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::presets::compact_bfv;
    use crate::sampling::sample_uniform_rns;
    use num_bigint::BigInt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_decomposition_recomposes() {
        let params = compact_bfv().unwrap();
        let basis = &params.ct_basis;
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let x = sample_uniform_rns(basis, &mut rng);

        let digits = gadget_decompose(&x, &params);
        assert_eq!(digits.len(), params.gadget_len());

        let mut acc = RnsPoly::zero(basis);
        let mut j = 0;
        for (i, &count) in params.gadget_digits.iter().enumerate() {
            for l in 0..count {
                let mut scalars = vec![0u64; basis.num_moduli()];
                let q = basis.moduli[i];
                let shift = crate::ring::modular::mod_pow(2, (params.gadget_log_base as usize * l) as u64, q);
                scalars[i] = mod_mul(basis.q_hat_mod[i], shift, q, basis.barrett_ks[i]);
                acc = acc.add(&digits[j].mul_limb_scalars(&scalars).unwrap()).unwrap();
                j += 1;
            }
        }
        assert_eq!(acc, x);

        let bound = BigInt::from(1u64 << params.gadget_log_base);
        for d in &digits {
            assert!(d.to_centered_bigints(basis).iter().all(|c| *c >= BigInt::from(0) && *c < bound));
        }
    }
}
