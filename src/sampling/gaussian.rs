use rand::Rng;

/// Cumulative distribution table of the discrete Gaussian over [-6σ, 6σ].
#[derive(Clone, Debug)]
pub struct CdtTable {
    tail: i64,
    cdf: Vec<f64>,
    total: f64,
}

impl CdtTable {
    pub fn new(sigma: f64) -> Self {
        let tail = (6.0 * sigma).ceil() as i64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut cdf = Vec::with_capacity((2 * tail + 1) as usize);
        let mut cumulative = 0.0f64;
        for x in -tail..=tail {
            cumulative += (-((x * x) as f64) / two_sigma_sq).exp();
            cdf.push(cumulative);
        }
        Self { tail, cdf, total: cumulative }
    }

    pub fn tail(&self) -> i64 {
        self.tail
    }

    /// One sample. The scan visits every entry and selects with integer
    /// masks, so the running time does not depend on the sampled value.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        let u: f64 = rng.random::<f64>() * self.total;
        let mut result = self.tail;
        for (i, &c) in self.cdf.iter().enumerate().rev() {
            let mask = ((u < c) as i64).wrapping_neg();
            let candidate = -self.tail + i as i64;
            result = (candidate & mask) | (result & !mask);
        }
        result
    }
}

/// Discrete Gaussian error polynomial with standard deviation `sigma`.
pub fn sample_gaussian<R: Rng>(n: usize, sigma: f64, rng: &mut R) -> Vec<i64> {
    let table = CdtTable::new(sigma);
    (0..n).map(|_| table.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_gaussian_moments() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sigma = 3.2;
        let samples = sample_gaussian(10_000, sigma, &mut rng);

        let n = samples.len() as f64;
        let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
        assert!(mean.abs() < 0.5, "mean = {mean}");

        let var = samples.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!((var - sigma * sigma).abs() < 2.0, "var = {var}");
    }

    #[test]
    fn test_gaussian_tail_bound() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let table = CdtTable::new(3.2);
        assert_eq!(table.tail(), 20);
        for _ in 0..5_000 {
            assert!(table.sample(&mut rng).abs() <= table.tail());
        }
    }
}
