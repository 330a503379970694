/// Barrett reduction: compute a mod m using precomputed Barrett constant.
///
/// Barrett constant k = floor(2^64 / m). For moduli ≤ 2^32, the single-word
/// Barrett trick is exact for inputs a < m^2. Larger moduli fall back to
/// u128 division.
#[inline(always)]
pub fn barrett_reduce(a: u128, m: u64, barrett_k: u64) -> u64 {
    if m > (1u64 << 32) {
        (a % m as u128) as u64
    } else {
        let q_hat = ((a * barrett_k as u128) >> 64) as u64;
        let r = (a as u64).wrapping_sub(q_hat.wrapping_mul(m));
        if r >= m { r.wrapping_sub(m) } else { r }
    }
}

/// Compute Barrett constant for modulus m: floor(2^64 / m)
#[inline]
pub fn barrett_constant(m: u64) -> u64 {
    debug_assert!(m > 1, "modulus must be > 1");
    ((1u128 << 64) / m as u128) as u64
}

/// Modular addition: (a + b) mod m, assumes a, b < m
#[inline(always)]
pub fn mod_add(a: u64, b: u64, m: u64) -> u64 {
    let sum = a as u128 + b as u128;
    let r = sum as u64;
    if sum >= m as u128 { r.wrapping_sub(m) } else { r }
}

/// Modular subtraction: (a - b) mod m, assumes a, b < m
#[inline(always)]
pub fn mod_sub(a: u64, b: u64, m: u64) -> u64 {
    if a >= b { a - b } else { m - b + a }
}

/// Modular negation: (-a) mod m, assumes a < m
#[inline(always)]
pub fn mod_neg(a: u64, m: u64) -> u64 {
    if a == 0 { 0 } else { m - a }
}

/// Modular multiplication: (a * b) mod m using Barrett reduction
#[inline(always)]
pub fn mod_mul(a: u64, b: u64, m: u64, barrett_k: u64) -> u64 {
    barrett_reduce(a as u128 * b as u128, m, barrett_k)
}

/// Modular exponentiation: a^exp mod m
pub fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let bk = barrett_constant(m);
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mod_mul(result, base, m, bk);
        }
        exp >>= 1;
        base = mod_mul(base, base, m, bk);
    }
    result
}

/// Find modular inverse: a^{-1} mod m using extended Euclidean algorithm
pub fn mod_inv(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (a as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);

    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }

    if old_r != 1 {
        return None;
    }

    Some(old_s.rem_euclid(m as i128) as u64)
}

/// Reduce a signed value into [0, m).
#[inline(always)]
pub fn reduce_signed(value: i64, m: u64) -> u64 {
    (value as i128).rem_euclid(m as i128) as u64
}

/// Deterministic Miller-Rabin for the full u64 range.
///
/// The first twelve primes as witnesses are enough for every n < 3.3·10^24.
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'witness: for &a in &WITNESSES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = ((x as u128 * x as u128) % n as u128) as u64;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Find `count` primes of exactly `bits` bits with p ≡ 1 (mod 2n).
///
/// Candidates are scanned downwards from 2^bits, so the result is sorted in
/// decreasing order and deterministic. Values in `exclude` are skipped.
/// Returns fewer than `count` primes if the progression runs out.
pub fn find_ntt_primes(bits: u32, ring_degree: usize, count: usize, exclude: &[u64]) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    if !(2..=62).contains(&bits) || count == 0 {
        return primes;
    }

    let step = 2 * ring_degree as u64;
    let upper = 1u64 << bits;
    let lower = 1u64 << (bits - 1);
    if step >= upper {
        return primes;
    }

    let mut candidate = upper - step + 1;
    while candidate > lower {
        if !exclude.contains(&candidate) && is_prime(candidate) {
            primes.push(candidate);
            if primes.len() == count {
                break;
            }
        }
        match candidate.checked_sub(step) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    primes
}
