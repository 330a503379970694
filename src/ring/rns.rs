use std::sync::Arc;
use concrete_ntt::prime64::Plan;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};
use rayon::prelude::*;

use crate::error::{Result, SchemeError};
use crate::ring::modular::{barrett_constant, mod_inv, mod_mul, reduce_signed};
use crate::ring::ntt::{make_plan, NttPoly};
use crate::ring::poly::{apply_automorphism, CoeffPoly};

/// Precomputed data for an RNS basis Q = ∏ q_i of NTT-friendly primes.
#[derive(Clone, Debug)]
pub struct RnsBasis {
    pub moduli: Vec<u64>,
    pub plans: Vec<Arc<Plan>>,
    pub ring_degree: usize,
    pub barrett_ks: Vec<u64>,
    /// (Q/q_i) mod q_i.
    pub q_hat_mod: Vec<u64>,
    /// (Q/q_i)^{-1} mod q_i.
    pub q_hat_inv: Vec<u64>,
    q_hat: Vec<BigUint>,
    moduli_big: Vec<BigInt>,
    product: BigUint,
    half_product: BigUint,
}

impl RnsBasis {
    pub fn new(moduli: Vec<u64>, ring_degree: usize) -> Result<Self, SchemeError> {
        if moduli.is_empty() {
            return Err(SchemeError::InvalidParam("RNS basis needs at least one modulus".into()));
        }

        let plans = moduli.iter()
            .map(|&q| make_plan(ring_degree, q))
            .collect::<Result<Vec<_>, _>>()?;
        let barrett_ks: Vec<u64> = moduli.iter().map(|&q| barrett_constant(q)).collect();

        let product = moduli.iter().fold(BigUint::one(), |acc, &q| acc * q);
        let q_hat: Vec<BigUint> = moduli.iter().map(|&q| &product / q).collect();

        let mut q_hat_mod = Vec::with_capacity(moduli.len());
        let mut q_hat_inv = Vec::with_capacity(moduli.len());
        for (i, &qi) in moduli.iter().enumerate() {
            let mut prod = 1u64;
            for (j, &qj) in moduli.iter().enumerate() {
                if i != j {
                    prod = mod_mul(prod, qj % qi, qi, barrett_ks[i]);
                }
            }
            let inv = mod_inv(prod, qi)
                .ok_or_else(|| SchemeError::InvalidParam("RNS moduli must be coprime".into()))?;
            q_hat_mod.push(prod);
            q_hat_inv.push(inv);
        }

        let moduli_big = moduli.iter().map(|&q| BigInt::from(q)).collect();
        let half_product = &product >> 1u32;

        Ok(Self {
            moduli,
            plans,
            ring_degree,
            barrett_ks,
            q_hat_mod,
            q_hat_inv,
            q_hat,
            moduli_big,
            product,
            half_product,
        })
    }

    pub fn num_moduli(&self) -> usize {
        self.moduli.len()
    }

    pub fn product(&self) -> &BigUint {
        &self.product
    }

    /// Bit length of Q.
    pub fn bits(&self) -> u32 {
        self.product.bits() as u32
    }

    /// CRT reconstruction of one coefficient, in [0, Q).
    pub fn reconstruct(&self, residues: &[u64]) -> BigUint {
        let mut acc = BigUint::zero();
        for (i, &r) in residues.iter().enumerate() {
            let y = mod_mul(r, self.q_hat_inv[i], self.moduli[i], self.barrett_ks[i]);
            acc += &self.q_hat[i] * y;
        }
        acc % &self.product
    }

    /// CRT reconstruction into the centered range (-Q/2, Q/2].
    pub fn reconstruct_centered(&self, residues: &[u64]) -> BigInt {
        self.center(self.reconstruct(residues))
    }

    pub fn center(&self, x: BigUint) -> BigInt {
        if x > self.half_product {
            BigInt::from_biguint(Sign::Minus, &self.product - x)
        } else {
            BigInt::from_biguint(Sign::Plus, x)
        }
    }

    /// Residue of a signed integer modulo the i-th prime.
    pub fn reduce(&self, value: &BigInt, i: usize) -> u64 {
        let q = self.moduli[i];
        // |value mod q_i| < q_i < 2^62, so the remainder fits in i64
        let r = (value % &self.moduli_big[i]).to_i64().unwrap_or_default();
        reduce_signed(r, q)
    }
}

/// Polynomial over Z_Q[X]/(X^n+1) stored as one NTT-domain limb per prime.
#[derive(Clone, Debug, PartialEq)]
pub struct RnsPoly {
    pub components: Vec<NttPoly>,
    pub ring_degree: usize,
}

impl RnsPoly {
    pub fn zero(basis: &RnsBasis) -> Self {
        let components = basis.plans.iter()
            .map(|plan| NttPoly::zero(basis.ring_degree, plan.clone()))
            .collect();
        Self { components, ring_degree: basis.ring_degree }
    }

    fn check_degree(len: usize, basis: &RnsBasis) -> Result<(), SchemeError> {
        if len != basis.ring_degree {
            return Err(SchemeError::DimensionMismatch {
                expected: basis.ring_degree,
                got: len,
            });
        }
        Ok(())
    }

    /// Lift a polynomial with non-negative coefficients into every limb.
    pub fn from_coeff_poly(poly: &CoeffPoly, basis: &RnsBasis) -> Result<Self, SchemeError> {
        Self::check_degree(poly.len(), basis)?;
        let limbs: Vec<Vec<u64>> = basis.moduli.iter()
            .map(|&q| poly.coeffs.iter().map(|&c| c % q).collect())
            .collect();
        Ok(Self::from_limbs(limbs, basis))
    }

    /// Lift a polynomial with small signed coefficients (keys, errors).
    pub fn from_signed(coeffs: &[i64], basis: &RnsBasis) -> Result<Self, SchemeError> {
        Self::check_degree(coeffs.len(), basis)?;
        let limbs: Vec<Vec<u64>> = basis.moduli.iter()
            .map(|&q| coeffs.iter().map(|&c| reduce_signed(c, q)).collect())
            .collect();
        Ok(Self::from_limbs(limbs, basis))
    }

    /// Build from coefficient-domain limbs, one per modulus, already reduced.
    pub fn from_limbs(limbs: Vec<Vec<u64>>, basis: &RnsBasis) -> Self {
        let components = limbs.into_par_iter()
            .zip(basis.plans.par_iter())
            .map(|(coeffs, plan)| NttPoly::from_coeffs(coeffs, plan.clone()))
            .collect();
        Self { components, ring_degree: basis.ring_degree }
    }

    /// Coefficient-domain limbs.
    pub fn to_limbs(&self) -> Vec<Vec<u64>> {
        self.components.par_iter().map(NttPoly::to_coeffs).collect()
    }

    /// Exact centered coefficients in (-Q/2, Q/2].
    pub fn to_centered_bigints(&self, basis: &RnsBasis) -> Vec<BigInt> {
        let limbs = self.to_limbs();
        (0..self.ring_degree)
            .into_par_iter()
            .map(|j| {
                let residues: Vec<u64> = limbs.iter().map(|limb| limb[j]).collect();
                basis.reconstruct_centered(&residues)
            })
            .collect()
    }

    /// Reduce exact integer coefficients into every limb of `basis`.
    pub fn from_bigints(coeffs: &[BigInt], basis: &RnsBasis) -> Result<Self, SchemeError> {
        Self::check_degree(coeffs.len(), basis)?;
        let limbs: Vec<Vec<u64>> = (0..basis.num_moduli())
            .into_par_iter()
            .map(|i| coeffs.iter().map(|c| basis.reduce(c, i)).collect::<Vec<u64>>())
            .collect();
        Ok(Self::from_limbs(limbs, basis))
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    fn check_components(&self, other: &Self) -> Result<(), SchemeError> {
        if self.components.len() != other.components.len() {
            return Err(SchemeError::DimensionMismatch {
                expected: self.components.len(),
                got: other.components.len(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_components(other)?;
        let components = self.components.iter()
            .zip(&other.components)
            .map(|(a, b)| a.add(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    pub fn sub(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_components(other)?;
        let components = self.components.iter()
            .zip(&other.components)
            .map(|(a, b)| a.sub(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    pub fn neg(&self) -> Self {
        let components = self.components.iter().map(NttPoly::neg).collect();
        Self { components, ring_degree: self.ring_degree }
    }

    pub fn mul(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_components(other)?;
        let components = self.components.par_iter()
            .zip(other.components.par_iter())
            .map(|(a, b)| a.mul(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let components = self.components.iter().map(|c| c.scalar_mul(scalar)).collect();
        Self { components, ring_degree: self.ring_degree }
    }

    /// Multiply limb i by `scalars[i]`; this is multiplication by the integer
    /// whose residues are `scalars`.
    pub fn mul_limb_scalars(&self, scalars: &[u64]) -> Result<Self, SchemeError> {
        if scalars.len() != self.components.len() {
            return Err(SchemeError::DimensionMismatch {
                expected: self.components.len(),
                got: scalars.len(),
            });
        }
        let components = self.components.iter()
            .zip(scalars)
            .map(|(c, &s)| c.scalar_mul(s))
            .collect();
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    /// Apply X → X^g limb by limb.
    pub fn automorphism(&self, g: usize) -> Self {
        let components = self.components.par_iter()
            .map(|c| {
                let permuted = apply_automorphism(&c.to_coeffs(), g, c.modulus);
                NttPoly::from_coeffs(permuted, c.plan.clone())
            })
            .collect();
        Self { components, ring_degree: self.ring_degree }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::modular::find_ntt_primes;

    const N: usize = 16;

    fn basis() -> RnsBasis {
        RnsBasis::new(find_ntt_primes(40, N, 3, &[]), N).unwrap()
    }

    #[test]
    fn test_basis_constants() {
        let b = basis();
        assert_eq!(b.num_moduli(), 3);
        assert!(b.bits() >= 118 && b.bits() <= 120);
        for i in 0..3 {
            let q = b.moduli[i];
            assert_eq!(mod_mul(b.q_hat_mod[i], b.q_hat_inv[i], q, b.barrett_ks[i]), 1);
        }
    }

    #[test]
    fn test_rejects_repeated_modulus() {
        let q = find_ntt_primes(40, N, 1, &[])[0];
        assert!(RnsBasis::new(vec![q, q], N).is_err());
        assert!(RnsBasis::new(vec![], N).is_err());
    }

    #[test]
    fn test_signed_roundtrip_through_crt() {
        let b = basis();
        let coeffs: Vec<i64> = (0..N as i64).map(|i| (i - 8) * 1_000_003).collect();
        let poly = RnsPoly::from_signed(&coeffs, &b).unwrap();
        let back = poly.to_centered_bigints(&b);
        let expected: Vec<BigInt> = coeffs.iter().map(|&c| BigInt::from(c)).collect();
        assert_eq!(back, expected);
    }

    #[test]
    fn test_bigint_roundtrip_beyond_u64() {
        let b = basis();
        let big = BigInt::from(1u128 << 100);
        let mut coeffs = vec![BigInt::zero(); N];
        coeffs[0] = big.clone();
        coeffs[5] = -big.clone();
        let poly = RnsPoly::from_bigints(&coeffs, &b).unwrap();
        assert_eq!(poly.to_centered_bigints(&b), coeffs);
    }

    #[test]
    fn test_mul_matches_naive_per_limb() {
        let b = basis();
        let a_coeffs: Vec<i64> = (0..N as i64).map(|i| i % 3 - 1).collect();
        let c_coeffs: Vec<i64> = (0..N as i64).map(|i| 2 * i - 5).collect();
        let prod = RnsPoly::from_signed(&a_coeffs, &b).unwrap()
            .mul(&RnsPoly::from_signed(&c_coeffs, &b).unwrap())
            .unwrap();

        let q = b.moduli[1];
        let a = CoeffPoly::from_coeffs(a_coeffs.iter().map(|&c| reduce_signed(c, q)).collect(), q);
        let c = CoeffPoly::from_coeffs(c_coeffs.iter().map(|&c| reduce_signed(c, q)).collect(), q);
        assert_eq!(prod.components[1].to_coeffs(), a.mul_naive(&c).unwrap().coeffs);
    }

    #[test]
    fn test_automorphism_matches_coeff_poly() {
        let b = basis();
        let coeffs: Vec<i64> = (0..N as i64).map(|i| i * i - 40).collect();
        let poly = RnsPoly::from_signed(&coeffs, &b).unwrap().automorphism(5);

        let q = b.moduli[0];
        let reference = CoeffPoly::from_coeffs(coeffs.iter().map(|&c| reduce_signed(c, q)).collect(), q)
            .automorphism(5);
        assert_eq!(poly.components[0].to_coeffs(), reference.coeffs);
    }

    #[test]
    fn test_mul_limb_scalars_is_crt_scalar() {
        // Residues (q_hat_mod[0], 0, 0) represent Q/q_0.
        let b = basis();
        let one = RnsPoly::from_signed(&[1; N], &b).unwrap();
        let mut scalars = vec![0u64; 3];
        scalars[0] = b.q_hat_mod[0];
        let scaled = one.mul_limb_scalars(&scalars).unwrap();
        let expected = b.center(b.product() / b.moduli[0]);
        assert!(scaled.to_centered_bigints(&b).iter().all(|c| *c == expected));
    }
}
