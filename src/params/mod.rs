pub mod presets;
pub mod security;
pub mod select;

pub use security::SecurityLevel;
pub use select::{
    search_ring_dimension, select, select_with_char_length, SchemeParameters,
    DEFAULT_CHAR_LENGTH, MAX_PLAINTEXT_MODULUS_BITS, MAX_RING_DIMENSION,
    MIN_PLAINTEXT_MODULUS_BITS,
};

use std::collections::BTreeMap;
use std::sync::Arc;
use concrete_ntt::prime64::Plan;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{Result, SchemeError};
use crate::ring::modular::find_ntt_primes;
use crate::ring::ntt::make_plan;
use crate::ring::rns::RnsBasis;

/// Bits reserved on top of log2 Q for the exact tensor product.
const EXT_BASIS_MARGIN_BITS: u32 = 4;
const EXT_PRIME_BITS: u32 = 60;
/// Fixed headroom for fresh noise and the key-switching additions.
const NOISE_HEADROOM_BITS: u32 = 14;

/// Parameters for the BFV scheme.
#[derive(Clone, Debug)]
pub struct BfvParams {
    /// Ring degree n (power of 2). Also the number of plaintext slots.
    pub ring_degree: usize,
    /// Plaintext modulus t, prime with t ≡ 1 (mod 2n).
    pub plain_modulus: u64,
    pub plain_modulus_bits: u32,
    /// NTT over Z_t, used to move between slots and plaintext coefficients.
    pub plain_plan: Arc<Plan>,
    /// RNS basis for the ciphertext modulus Q = ∏ q_i.
    pub ct_basis: Arc<RnsBasis>,
    /// Q ∪ P for exact tensoring. The first primes are those of Q.
    pub ext_basis: Arc<RnsBasis>,
    /// Δ = ⌊Q/t⌋ mod q_i.
    pub delta: Vec<u64>,
    /// Q mod t.
    pub q_mod_t: u64,
    /// Gaussian noise standard deviation.
    pub sigma: f64,
    /// Key switching splits each RNS limb into digits of this many bits.
    pub gadget_log_base: u32,
    /// Number of gadget digits per RNS limb.
    pub gadget_digits: Vec<usize>,
    /// Set when Q was taken from the standard table.
    pub security: Option<SecurityLevel>,
}

impl BfvParams {
    /// Standard parameters for `(ring_degree, plaintext_modulus_bits, security)`.
    pub fn generate(
        ring_degree: usize,
        plain_modulus_bits: u32,
        security: SecurityLevel,
    ) -> Result<Arc<Self>, SchemeError> {
        BfvParamsBuilder::new()
            .ring_degree(ring_degree)
            .plain_modulus_bits(plain_modulus_bits)
            .security(security)
            .build()
    }

    pub fn slot_count(&self) -> usize {
        self.ring_degree
    }

    pub fn log2_ring_degree(&self) -> u32 {
        self.ring_degree.trailing_zeros()
    }

    /// Total noise budget this context offers a computation, in bits:
    /// log2 Q minus the growth of the rotate-and-sum reduction (log2 n),
    /// the multiplication expansion factor (log2 n) and a fixed headroom.
    pub fn noise_budget_bits(&self) -> u32 {
        self.ct_basis
            .bits()
            .saturating_sub(2 * self.log2_ring_degree() + NOISE_HEADROOM_BITS)
    }

    /// Total number of key-switching key entries.
    pub fn gadget_len(&self) -> usize {
        self.gadget_digits.iter().sum()
    }
}

/// Builder for BfvParams.
pub struct BfvParamsBuilder {
    ring_degree: usize,
    plain_modulus_bits: u32,
    security: SecurityLevel,
    coeff_modulus_bits: Option<Vec<u32>>,
    sigma: f64,
    gadget_log_base: Option<u32>,
}

impl Default for BfvParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BfvParamsBuilder {
    pub fn new() -> Self {
        Self {
            ring_degree: 4096,
            plain_modulus_bits: MIN_PLAINTEXT_MODULUS_BITS,
            security: SecurityLevel::Bits128,
            coeff_modulus_bits: None,
            sigma: 3.2,
            gadget_log_base: None,
        }
    }

    pub fn ring_degree(mut self, n: usize) -> Self {
        self.ring_degree = n;
        self
    }

    pub fn plain_modulus_bits(mut self, bits: u32) -> Self {
        self.plain_modulus_bits = bits;
        self
    }

    pub fn security(mut self, level: SecurityLevel) -> Self {
        self.security = level;
        self
    }

    /// Explicit prime sizes for Q, bypassing the security table.
    pub fn coeff_modulus_bits(mut self, bits: Vec<u32>) -> Self {
        self.coeff_modulus_bits = Some(bits);
        self
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn gadget_log_base(mut self, bits: u32) -> Self {
        self.gadget_log_base = Some(bits);
        self
    }

    pub fn build(self) -> Result<Arc<BfvParams>, SchemeError> {
        let n = self.ring_degree;
        if !n.is_power_of_two() || n < 16 {
            return Err(SchemeError::InvalidRingDegree(n));
        }
        if !(2..=MAX_PLAINTEXT_MODULUS_BITS).contains(&self.plain_modulus_bits) {
            return Err(SchemeError::InvalidParam(format!(
                "plaintext modulus must have 2..={MAX_PLAINTEXT_MODULUS_BITS} bits, got {}",
                self.plain_modulus_bits
            )));
        }

        let (q_bits, security) = match self.coeff_modulus_bits {
            Some(bits) => (bits, None),
            None => {
                let bits = security::coeff_modulus_bits(n, self.security).ok_or(
                    SchemeError::UnsupportedRing {
                        ring_degree: n,
                        security_bits: self.security.bits(),
                    },
                )?;
                (bits.to_vec(), Some(self.security))
            }
        };
        if q_bits.is_empty() || q_bits.iter().any(|&b| !(20..=60).contains(&b)) {
            return Err(SchemeError::InvalidParam(
                "coefficient modulus primes must have 20..=60 bits".into(),
            ));
        }

        let plain_modulus = find_ntt_primes(self.plain_modulus_bits, n, 1, &[])
            .first()
            .copied()
            .ok_or(SchemeError::NoNttPrime {
                bits: self.plain_modulus_bits,
                ring_degree: n,
            })?;
        let plain_plan = make_plan(n, plain_modulus)?;

        let ct_moduli = choose_moduli(&q_bits, n, &[plain_modulus])?;
        let ct_basis = RnsBasis::new(ct_moduli.clone(), n)?;

        let ext_bits = ct_basis.bits() + n.trailing_zeros() + EXT_BASIS_MARGIN_BITS;
        let ext_count = ext_bits.div_ceil(EXT_PRIME_BITS) as usize;
        let mut exclude = ct_moduli.clone();
        exclude.push(plain_modulus);
        let aux_moduli = find_ntt_primes(EXT_PRIME_BITS, n, ext_count, &exclude);
        if aux_moduli.len() < ext_count {
            return Err(SchemeError::NoNttPrime { bits: EXT_PRIME_BITS, ring_degree: n });
        }
        let ext_moduli: Vec<u64> = ct_moduli.iter().chain(&aux_moduli).copied().collect();
        let ext_basis = RnsBasis::new(ext_moduli, n)?;

        let delta_big: BigUint = ct_basis.product() / plain_modulus;
        let delta = ct_moduli.iter().map(|&q| biguint_mod(&delta_big, q)).collect();
        let q_mod_t = biguint_mod(ct_basis.product(), plain_modulus);

        let max_limb_bits = q_bits.iter().copied().max().unwrap_or(EXT_PRIME_BITS);
        let gadget_log_base = self
            .gadget_log_base
            .unwrap_or_else(|| (ct_basis.bits() / 8).clamp(16, max_limb_bits));
        if !(1..=60).contains(&gadget_log_base) {
            return Err(SchemeError::InvalidParam(format!(
                "gadget base must be 2^1..=2^60, got 2^{gadget_log_base}"
            )));
        }
        let gadget_digits = ct_moduli
            .iter()
            .map(|&q| (64 - q.leading_zeros()).div_ceil(gadget_log_base) as usize)
            .collect();

        Ok(Arc::new(BfvParams {
            ring_degree: n,
            plain_modulus,
            plain_modulus_bits: self.plain_modulus_bits,
            plain_plan,
            ct_basis: Arc::new(ct_basis),
            ext_basis: Arc::new(ext_basis),
            delta,
            q_mod_t,
            sigma: self.sigma,
            gadget_log_base,
            gadget_digits,
            security,
        }))
    }
}

/// One distinct NTT prime per requested size, in the order requested.
fn choose_moduli(bits: &[u32], n: usize, exclude: &[u64]) -> Result<Vec<u64>, SchemeError> {
    let mut wanted: BTreeMap<u32, usize> = BTreeMap::new();
    for &b in bits {
        *wanted.entry(b).or_default() += 1;
    }

    let mut pools: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
    for (&b, &count) in &wanted {
        let primes = find_ntt_primes(b, n, count, exclude);
        if primes.len() < count {
            return Err(SchemeError::NoNttPrime { bits: b, ring_degree: n });
        }
        pools.insert(b, primes);
    }

    bits.iter()
        .map(|b| {
            pools
                .get_mut(b)
                .and_then(|pool| pool.pop())
                .ok_or(SchemeError::NoNttPrime { bits: *b, ring_degree: n })
        })
        .collect()
}

fn biguint_mod(x: &BigUint, m: u64) -> u64 {
    // the remainder is below m
    (x % m).to_u64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::modular::is_prime;

    #[test]
    fn test_standard_context() {
        let params = BfvParams::generate(4096, 24, SecurityLevel::Bits128).unwrap();
        assert_eq!(params.slot_count(), 4096);
        assert_eq!(params.plain_modulus, 16760833);
        assert_eq!(params.plain_modulus % 8192, 1);
        assert_eq!(params.ct_basis.num_moduli(), 3);
        assert_eq!(params.ct_basis.bits(), 109);
        assert_eq!(params.security, Some(SecurityLevel::Bits128));
        // 109 - 24 - 14
        assert_eq!(params.noise_budget_bits(), 71);
        assert!(params.ext_basis.bits() >= 2 * 109 + 12 + 4);
        assert_eq!(params.gadget_log_base, 16);
        assert_eq!(params.gadget_digits, vec![3, 3, 3]);
    }

    #[test]
    fn test_ext_basis_extends_ct_basis() {
        let params = BfvParams::generate(4096, 24, SecurityLevel::Bits192).unwrap();
        let k = params.ct_basis.num_moduli();
        assert_eq!(&params.ext_basis.moduli[..k], &params.ct_basis.moduli[..]);
        for &p in &params.ext_basis.moduli[k..] {
            assert!(is_prime(p));
            assert!(!params.ct_basis.moduli.contains(&p));
        }
    }

    #[test]
    fn test_delta() {
        let params = BfvParams::generate(4096, 17, SecurityLevel::Bits128).unwrap();
        let delta = params.ct_basis.product() / params.plain_modulus;
        let residue = (&delta % params.ct_basis.moduli[1]).to_u64().unwrap();
        assert_eq!(params.delta[1], residue);
        let q_mod_t = (params.ct_basis.product() % params.plain_modulus).to_u64().unwrap();
        assert_eq!(params.q_mod_t, q_mod_t);
    }

    #[test]
    fn test_unsupported_ring() {
        let err = BfvParams::generate(2048, 17, SecurityLevel::Bits128).unwrap_err();
        assert_eq!(err, SchemeError::UnsupportedRing { ring_degree: 2048, security_bits: 128 });
    }

    #[test]
    fn test_missing_plaintext_prime() {
        let err = BfvParams::generate(32768, 18, SecurityLevel::Bits128).unwrap_err();
        assert_eq!(err, SchemeError::NoNttPrime { bits: 18, ring_degree: 32768 });
    }

    #[test]
    fn test_explicit_moduli_and_validation() {
        let params = BfvParamsBuilder::new()
            .ring_degree(64)
            .plain_modulus_bits(17)
            .coeff_modulus_bits(vec![40, 40])
            .gadget_log_base(20)
            .build()
            .unwrap();
        assert_eq!(params.security, None);
        assert_eq!(params.gadget_digits, vec![2, 2]);
        assert_eq!(params.gadget_len(), 4);
        assert_ne!(params.ct_basis.moduli[0], params.ct_basis.moduli[1]);

        assert!(BfvParamsBuilder::new().ring_degree(100).build().is_err());
        assert!(BfvParamsBuilder::new().plain_modulus_bits(61).build().is_err());
    }
}
