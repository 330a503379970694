use std::sync::Arc;
use concrete_ntt::prime64::Plan;

use crate::error::{Result, SchemeError};
use crate::ring::modular::{barrett_constant, mod_add, mod_mul, mod_neg, mod_sub};

/// Polynomial in NTT (evaluation) representation over Z_q[X]/(X^n + 1).
///
/// The negacyclic transform evaluates the polynomial at the n primitive
/// 2n-th roots of unity mod q, so pointwise products are ring products.
#[derive(Clone, Debug)]
pub struct NttPoly {
    pub evals: Vec<u64>,
    pub modulus: u64,
    pub plan: Arc<Plan>,
}

/// Build an NTT plan for ring degree `n` and prime `modulus ≡ 1 (mod 2n)`.
pub fn make_plan(n: usize, modulus: u64) -> Result<Arc<Plan>, SchemeError> {
    if !n.is_power_of_two() || n < 16 {
        return Err(SchemeError::InvalidRingDegree(n));
    }
    let plan = Plan::try_new(n, modulus).ok_or_else(|| {
        SchemeError::InvalidParam(format!(
            "cannot create NTT plan for n={n}, q={modulus} (need prime q ≡ 1 mod {})",
            2 * n
        ))
    })?;
    Ok(Arc::new(plan))
}

impl NttPoly {
    pub fn zero(n: usize, plan: Arc<Plan>) -> Self {
        Self {
            evals: vec![0u64; n],
            modulus: plan.modulus(),
            plan,
        }
    }

    /// Forward NTT of coefficients already reduced mod the plan's modulus.
    pub fn from_coeffs(mut coeffs: Vec<u64>, plan: Arc<Plan>) -> Self {
        plan.fwd(&mut coeffs);
        Self {
            evals: coeffs,
            modulus: plan.modulus(),
            plan,
        }
    }

    /// Wrap values that are already evaluations (e.g. plaintext slots).
    pub fn from_evals(evals: Vec<u64>, plan: Arc<Plan>) -> Self {
        Self {
            evals,
            modulus: plan.modulus(),
            plan,
        }
    }

    /// Inverse NTT back to coefficients in [0, q).
    pub fn to_coeffs(&self) -> Vec<u64> {
        let mut coeffs = self.evals.clone();
        self.plan.inv(&mut coeffs);
        self.plan.normalize(&mut coeffs);
        coeffs
    }

    pub fn len(&self) -> usize {
        self.evals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evals.is_empty()
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SchemeError> {
        if self.modulus != other.modulus {
            return Err(SchemeError::ModulusMismatch);
        }
        if self.len() != other.len() {
            return Err(SchemeError::DimensionMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let q = self.modulus;
        let evals = self.evals.iter()
            .zip(&other.evals)
            .map(|(&a, &b)| mod_add(a, b, q))
            .collect();
        Ok(Self { evals, modulus: q, plan: self.plan.clone() })
    }

    pub fn sub(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let q = self.modulus;
        let evals = self.evals.iter()
            .zip(&other.evals)
            .map(|(&a, &b)| mod_sub(a, b, q))
            .collect();
        Ok(Self { evals, modulus: q, plan: self.plan.clone() })
    }

    pub fn neg(&self) -> Self {
        let q = self.modulus;
        let evals = self.evals.iter().map(|&a| mod_neg(a, q)).collect();
        Self { evals, modulus: q, plan: self.plan.clone() }
    }

    /// Pointwise product (= negacyclic polynomial product).
    pub fn mul(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let q = self.modulus;
        let bk = barrett_constant(q);
        let evals = self.evals.iter()
            .zip(&other.evals)
            .map(|(&a, &b)| mod_mul(a, b, q, bk))
            .collect();
        Ok(Self { evals, modulus: q, plan: self.plan.clone() })
    }

    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let q = self.modulus;
        let s = scalar % q;
        let bk = barrett_constant(q);
        let evals = self.evals.iter().map(|&a| mod_mul(a, s, q, bk)).collect();
        Self { evals, modulus: q, plan: self.plan.clone() }
    }

    pub fn is_zero(&self) -> bool {
        self.evals.iter().all(|&e| e == 0)
    }
}

impl PartialEq for NttPoly {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus && self.evals == other.evals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::poly::CoeffPoly;

    const N: usize = 16;
    const Q: u64 = 65537;

    fn padded(v: &[u64]) -> Vec<u64> {
        let mut r = vec![0u64; N];
        r[..v.len()].copy_from_slice(v);
        r
    }

    #[test]
    fn test_ntt_roundtrip() {
        let plan = make_plan(N, Q).unwrap();
        let coeffs = padded(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let ntt = NttPoly::from_coeffs(coeffs.clone(), plan);
        assert_eq!(ntt.to_coeffs(), coeffs);
    }

    #[test]
    fn test_ntt_mul_is_negacyclic() {
        let plan = make_plan(N, Q).unwrap();
        let a = CoeffPoly::from_coeffs(padded(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]), Q);
        let b = CoeffPoly::from_coeffs(padded(&[3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 7]), Q);
        let expected = a.mul_naive(&b).unwrap();

        let a_ntt = NttPoly::from_coeffs(a.coeffs.clone(), plan.clone());
        let b_ntt = NttPoly::from_coeffs(b.coeffs.clone(), plan);
        assert_eq!(a_ntt.mul(&b_ntt).unwrap().to_coeffs(), expected.coeffs);
    }

    #[test]
    fn test_ntt_sum_of_evals_is_scaled_constant_term() {
        // Σ_j a(ψ^{2j+1}) = n·a_0 for any negacyclic evaluation order.
        let plan = make_plan(N, Q).unwrap();
        let coeffs = padded(&[9, 4, 0, 11, 0, 0, 3]);
        let ntt = NttPoly::from_coeffs(coeffs, plan);
        let sum = ntt.evals.iter().fold(0u64, |acc, &e| mod_add(acc, e, Q));
        assert_eq!(sum, (9 * N as u64) % Q);
    }

    #[test]
    fn test_rejects_bad_plan() {
        assert!(matches!(make_plan(12, Q), Err(SchemeError::InvalidRingDegree(12))));
        // 65539 is prime but not ≡ 1 mod 32
        assert!(make_plan(N, 65539).is_err());
    }

    #[test]
    fn test_mismatched_moduli() {
        let a = NttPoly::zero(N, make_plan(N, Q).unwrap());
        let b = NttPoly::zero(N, make_plan(N, 786433).unwrap());
        assert_eq!(a.add(&b), Err(SchemeError::ModulusMismatch));
    }
}
