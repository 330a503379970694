use std::collections::BTreeMap;
use std::sync::Arc;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use zeroize::Zeroize;

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::modular::{mod_mul, mod_pow};
use crate::ring::poly::apply_automorphism_signed;
use crate::ring::rns::RnsPoly;
use crate::sampling::{sample_gaussian, sample_ternary, sample_uniform_rns};

/// BFV secret key: ternary s, kept both as signed coefficients and in RNS-NTT form.
pub struct SecretKey {
    coeffs: Vec<i64>,
    pub poly: RnsPoly,
    pub params: Arc<BfvParams>,
}

impl SecretKey {
    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.coeffs.zeroize();
        for comp in &mut self.poly.components {
            comp.evals.zeroize();
        }
    }
}

/// BFV public key: pk = (pk0, pk1) where pk0 = -(a·s + e), pk1 = a.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub pk0: RnsPoly,
    pub pk1: RnsPoly,
    pub params: Arc<BfvParams>,
}

/// Encryptions of g_j · s' under s, one per gadget entry, ordered by RNS
/// limb then digit. Entry (i, l) uses g = (Q/q_i) · 2^{w·l}.
#[derive(Clone, Debug)]
pub struct KeySwitchKey {
    pub keys: Vec<(RnsPoly, RnsPoly)>,
    pub params: Arc<BfvParams>,
}

/// Key switch from s² to s.
#[derive(Clone, Debug)]
pub struct RelinKey {
    pub key: KeySwitchKey,
}

/// Key switch from s(X^element) to s(X).
#[derive(Clone, Debug)]
pub struct GaloisKey {
    pub element: usize,
    pub key: KeySwitchKey,
}

/// Galois keys indexed by element.
#[derive(Clone, Debug, Default)]
pub struct GaloisKeys {
    keys: BTreeMap<usize, GaloisKey>,
}

impl GaloisKeys {
    pub fn get(&self, element: usize) -> Result<&GaloisKey, SchemeError> {
        self.keys
            .get(&element)
            .ok_or_else(|| SchemeError::MissingKey(format!("galois element {element}")))
    }

    pub fn insert(&mut self, key: GaloisKey) {
        self.keys.insert(key.element, key);
    }

    pub fn elements(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// All keys of one context.
pub struct KeyMaterial {
    pub secret: SecretKey,
    pub public: PublicKey,
    pub relin: RelinKey,
    pub galois: GaloisKeys,
}

/// Galois elements whose automorphisms sum every slot into every slot:
/// 3^(2^k) mod 2n for k < log2(n/2), then 2n - 1.
pub fn trace_galois_elements(ring_degree: usize) -> Vec<usize> {
    let two_n = 2 * ring_degree;
    let steps = (ring_degree / 2).trailing_zeros();
    let mut elements = Vec::with_capacity(steps as usize + 1);
    let mut g = 3usize;
    for _ in 0..steps {
        elements.push(g);
        g = (g * g) % two_n;
    }
    elements.push(two_n - 1);
    elements
}

/// Generate a secret key (ternary distribution).
pub fn gen_secret_key(params: &Arc<BfvParams>) -> Result<SecretKey, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    gen_secret_key_with_rng(params, &mut rng)
}

/// Generate a secret key with a provided RNG.
pub fn gen_secret_key_with_rng<R: rand::Rng>(
    params: &Arc<BfvParams>,
    rng: &mut R,
) -> Result<SecretKey, SchemeError> {
    let coeffs = sample_ternary(params.ring_degree, rng);
    let poly = RnsPoly::from_signed(&coeffs, &params.ct_basis)?;
    Ok(SecretKey {
        coeffs,
        poly,
        params: params.clone(),
    })
}

/// Generate a public key from a secret key.
pub fn gen_public_key(sk: &SecretKey) -> Result<PublicKey, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    gen_public_key_with_rng(sk, &mut rng)
}

pub fn gen_public_key_with_rng<R: rand::Rng>(
    sk: &SecretKey,
    rng: &mut R,
) -> Result<PublicKey, SchemeError> {
    let (pk0, pk1) = rlwe_sample(sk, rng)?;
    Ok(PublicKey {
        pk0,
        pk1,
        params: sk.params.clone(),
    })
}

/// (-(a·s + e), a) for uniform a and Gaussian e.
fn rlwe_sample<R: rand::Rng>(sk: &SecretKey, rng: &mut R) -> Result<(RnsPoly, RnsPoly), SchemeError> {
    let params = &sk.params;
    let basis = &params.ct_basis;
    let a = sample_uniform_rns(basis, rng);
    let e = RnsPoly::from_signed(&sample_gaussian(params.ring_degree, params.sigma, rng), basis)?;
    let b = a.mul(&sk.poly)?.add(&e)?.neg();
    Ok((b, a))
}

/// Key-switching key from `target` to `sk`.
pub fn gen_key_switch_key_with_rng<R: rand::Rng>(
    sk: &SecretKey,
    target: &RnsPoly,
    rng: &mut R,
) -> Result<KeySwitchKey, SchemeError> {
    let params = &sk.params;
    let basis = &params.ct_basis;
    let mut keys = Vec::with_capacity(params.gadget_len());

    for (i, &digits) in params.gadget_digits.iter().enumerate() {
        let q = basis.moduli[i];
        for l in 0..digits {
            // g = (Q/q_i)·2^{wl} vanishes mod every q_j except q_i
            let mut scalars = vec![0u64; basis.num_moduli()];
            let shift = mod_pow(2, (params.gadget_log_base as usize * l) as u64, q);
            scalars[i] = mod_mul(basis.q_hat_mod[i], shift, q, basis.barrett_ks[i]);

            let (b, a) = rlwe_sample(sk, rng)?;
            let ks0 = b.add(&target.mul_limb_scalars(&scalars)?)?;
            keys.push((ks0, a));
        }
    }

    Ok(KeySwitchKey {
        keys,
        params: params.clone(),
    })
}

/// Generate a relinearization key.
pub fn gen_relin_key(sk: &SecretKey) -> Result<RelinKey, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    gen_relin_key_with_rng(sk, &mut rng)
}

pub fn gen_relin_key_with_rng<R: rand::Rng>(
    sk: &SecretKey,
    rng: &mut R,
) -> Result<RelinKey, SchemeError> {
    let s_sq = sk.poly.mul(&sk.poly)?;
    Ok(RelinKey {
        key: gen_key_switch_key_with_rng(sk, &s_sq, rng)?,
    })
}

/// Generate a Galois key for automorphism X → X^element.
pub fn gen_galois_key(sk: &SecretKey, element: usize) -> Result<GaloisKey, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    gen_galois_key_with_rng(sk, element, &mut rng)
}

pub fn gen_galois_key_with_rng<R: rand::Rng>(
    sk: &SecretKey,
    element: usize,
    rng: &mut R,
) -> Result<GaloisKey, SchemeError> {
    let n = sk.params.ring_degree;
    if element % 2 == 0 || element >= 2 * n {
        return Err(SchemeError::InvalidParam(format!(
            "galois element must be odd and below {}, got {element}",
            2 * n
        )));
    }
    let mut s_auto = apply_automorphism_signed(sk.coeffs(), element);
    let target = RnsPoly::from_signed(&s_auto, &sk.params.ct_basis);
    s_auto.zeroize();
    Ok(GaloisKey {
        element,
        key: gen_key_switch_key_with_rng(sk, &target?, rng)?,
    })
}

/// Galois keys for the trace used by `bfv_cumulative_add`.
pub fn gen_trace_galois_keys_with_rng<R: rand::Rng>(
    sk: &SecretKey,
    rng: &mut R,
) -> Result<GaloisKeys, SchemeError> {
    let mut keys = GaloisKeys::default();
    for element in trace_galois_elements(sk.params.ring_degree) {
        keys.insert(gen_galois_key_with_rng(sk, element, rng)?);
    }
    Ok(keys)
}

/// Secret, public, relinearization and trace Galois keys for `params`.
pub fn gen_key_material(params: &Arc<BfvParams>) -> Result<KeyMaterial, SchemeError> {
    let mut rng = ChaCha20Rng::from_os_rng();
    gen_key_material_with_rng(params, &mut rng)
}

pub fn gen_key_material_with_rng<R: rand::Rng>(
    params: &Arc<BfvParams>,
    rng: &mut R,
) -> Result<KeyMaterial, SchemeError> {
    let secret = gen_secret_key_with_rng(params, rng)?;
    let public = gen_public_key_with_rng(&secret, rng)?;
    let relin = gen_relin_key_with_rng(&secret, rng)?;
    let galois = gen_trace_galois_keys_with_rng(&secret, rng)?;
    Ok(KeyMaterial {
        secret,
        public,
        relin,
        galois,
    })
}
