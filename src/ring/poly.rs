use crate::error::{Result, SchemeError};
use crate::ring::modular::{barrett_constant, mod_add, mod_mul, mod_neg, mod_sub};

/// Polynomial in coefficient representation over Z_q[X]/(X^n + 1).
///
/// Used for plaintexts (q = t) and as the reference implementation in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoeffPoly {
    pub coeffs: Vec<u64>,
    pub modulus: u64,
}

impl CoeffPoly {
    pub fn zero(n: usize, modulus: u64) -> Self {
        Self {
            coeffs: vec![0u64; n],
            modulus,
        }
    }

    /// Create a polynomial from coefficients, reducing them mod q.
    pub fn from_coeffs(mut coeffs: Vec<u64>, modulus: u64) -> Self {
        for c in coeffs.iter_mut() {
            *c %= modulus;
        }
        Self { coeffs, modulus }
    }

    /// The constant polynomial `value`.
    pub fn constant(n: usize, value: u64, modulus: u64) -> Self {
        let mut p = Self::zero(n, modulus);
        p.coeffs[0] = value % modulus;
        p
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SchemeError> {
        if self.len() != other.len() {
            return Err(SchemeError::DimensionMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        if self.modulus != other.modulus {
            return Err(SchemeError::ModulusMismatch);
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let coeffs = self.coeffs.iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| mod_add(a, b, self.modulus))
            .collect();
        Ok(Self { coeffs, modulus: self.modulus })
    }

    pub fn sub(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let coeffs = self.coeffs.iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| mod_sub(a, b, self.modulus))
            .collect();
        Ok(Self { coeffs, modulus: self.modulus })
    }

    pub fn neg(&self) -> Self {
        let coeffs = self.coeffs.iter().map(|&a| mod_neg(a, self.modulus)).collect();
        Self { coeffs, modulus: self.modulus }
    }

    /// Schoolbook product in Z_q[X]/(X^n+1). Quadratic; tests only.
    pub fn mul_naive(&self, other: &Self) -> Result<Self, SchemeError> {
        self.check_compatible(other)?;
        let n = self.len();
        let q = self.modulus;
        let bk = barrett_constant(q);
        let mut result = vec![0u64; n];

        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in other.coeffs.iter().enumerate() {
                if b == 0 {
                    continue;
                }
                let prod = mod_mul(a, b, q, bk);
                let idx = i + j;
                if idx < n {
                    result[idx] = mod_add(result[idx], prod, q);
                } else {
                    // X^n = -1
                    result[idx - n] = mod_sub(result[idx - n], prod, q);
                }
            }
        }

        Ok(Self { coeffs: result, modulus: q })
    }

    /// Apply the automorphism X → X^g (g odd), a signed permutation of the
    /// coefficients since X^n = -1.
    pub fn automorphism(&self, g: usize) -> Self {
        Self {
            coeffs: apply_automorphism(&self.coeffs, g, self.modulus),
            modulus: self.modulus,
        }
    }

    /// Centered representatives in (-q/2, q/2].
    pub fn centered_coeffs(&self) -> Vec<i64> {
        let half = self.modulus / 2;
        self.coeffs.iter()
            .map(|&c| if c > half { c as i64 - self.modulus as i64 } else { c as i64 })
            .collect()
    }
}

/// X^i → ±X^{i·g mod n} on a coefficient vector mod q.
pub fn apply_automorphism(coeffs: &[u64], g: usize, q: u64) -> Vec<u64> {
    let n = coeffs.len();
    let mut result = vec![0u64; n];
    for (i, &c) in coeffs.iter().enumerate() {
        if c == 0 {
            continue;
        }
        let exp = (i * g) % (2 * n);
        if exp < n {
            result[exp] = mod_add(result[exp], c, q);
        } else {
            result[exp - n] = mod_sub(result[exp - n], c, q);
        }
    }
    result
}

/// Same permutation on signed coefficients (secret keys).
pub fn apply_automorphism_signed(coeffs: &[i64], g: usize) -> Vec<i64> {
    let n = coeffs.len();
    let mut result = vec![0i64; n];
    for (i, &c) in coeffs.iter().enumerate() {
        let exp = (i * g) % (2 * n);
        if exp < n {
            result[exp] += c;
        } else {
            result[exp - n] -= c;
        }
    }
    result
}
