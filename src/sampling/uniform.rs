use rand::Rng;

use crate::ring::ntt::NttPoly;
use crate::ring::rns::{RnsBasis, RnsPoly};

/// Uniform residues in [0, modulus) by rejection sampling.
pub fn sample_uniform<R: Rng>(n: usize, modulus: u64, rng: &mut R) -> Vec<u64> {
    let mask = if modulus.is_power_of_two() {
        modulus - 1
    } else {
        u64::MAX >> modulus.leading_zeros()
    };

    (0..n)
        .map(|_| loop {
            let val = rng.random::<u64>() & mask;
            if val < modulus {
                break val;
            }
        })
        .collect()
}

/// Uniform element of R_Q. Each limb is sampled independently, which by CRT
/// is the same as sampling uniformly mod Q. The NTT of a uniform vector is
/// uniform, so the limbs are taken directly as evaluations.
pub fn sample_uniform_rns<R: Rng>(basis: &RnsBasis, rng: &mut R) -> RnsPoly {
    let components = basis.moduli.iter()
        .zip(&basis.plans)
        .map(|(&q, plan)| NttPoly::from_evals(sample_uniform(basis.ring_degree, q, rng), plan.clone()))
        .collect();
    RnsPoly { components, ring_degree: basis.ring_degree }
}

/// Ternary coefficients, each of -1, 0, 1 with probability 1/3.
pub fn sample_ternary<R: Rng>(n: usize, rng: &mut R) -> Vec<i64> {
    (0..n)
        .map(|_| {
            let val = loop {
                let r = rng.random::<u8>() & 0x03;
                if r < 3 {
                    break r;
                }
            };
            val as i64 - 1
        })
        .collect()
}

/// Binary coefficients {0, 1}.
pub fn sample_binary<R: Rng>(n: usize, rng: &mut R) -> Vec<i64> {
    (0..n).map(|_| (rng.random::<u64>() & 1) as i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniform_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let values = sample_uniform(4096, 65537, &mut rng);
        assert!(values.iter().all(|&c| c < 65537));
        // mask for 65537 is 2^17 - 1, so both halves of the range show up
        assert!(values.iter().any(|&c| c > 32768));
        assert!(values.iter().any(|&c| c < 32768));
    }

    #[test]
    fn test_ternary_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let s = sample_ternary(1024, &mut rng);
        for v in [-1i64, 0, 1] {
            let count = s.iter().filter(|&&c| c == v).count();
            assert!(count > 250 && count < 450, "{v}: {count}");
        }
        assert!(s.iter().all(|c| (-1..=1).contains(c)));
    }

    #[test]
    fn test_binary() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let u = sample_binary(1024, &mut rng);
        assert!(u.iter().all(|&c| c == 0 || c == 1));
        assert!(u.iter().any(|&c| c == 1));
    }

    #[test]
    fn test_uniform_rns_limbs_reduced() {
        let primes = crate::ring::modular::find_ntt_primes(40, 16, 2, &[]);
        let basis = RnsBasis::new(primes, 16).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let a = sample_uniform_rns(&basis, &mut rng);
        for (limb, &q) in a.components.iter().zip(&basis.moduli) {
            assert!(limb.evals.iter().all(|&e| e < q));
        }
    }
}
