use std::sync::Arc;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::bfv::BfvCiphertext;
use crate::bfv::encoding::{decode_slots, encode_slots};
use crate::bfv::encrypt::{decrypt, encrypt_pk_with_rng, noise_budget};
use crate::bfv::eval::{
    bfv_add, bfv_apply_galois, bfv_complement, bfv_cumulative_add, bfv_mul_and_relin, bfv_mul_scalar, bfv_neg,
    bfv_sub,
};
use crate::bfv::keygen::{gen_key_material_with_rng, KeyMaterial};

/// A BFV context together with its keys: the slot-level interface the
/// matcher works against.
///
/// Immutable once built; every method takes `&self`, so one instance may
/// be shared across threads.
pub struct BfvScheme {
    params: Arc<BfvParams>,
    keys: KeyMaterial,
}

impl BfvScheme {
    /// Generate secret, public, relinearization and trace Galois keys.
    pub fn new(params: Arc<BfvParams>) -> Result<Self, SchemeError> {
        let mut rng = ChaCha20Rng::from_os_rng();
        Self::with_rng(params, &mut rng)
    }

    pub fn with_rng<R: rand::Rng>(params: Arc<BfvParams>, rng: &mut R) -> Result<Self, SchemeError> {
        let keys = gen_key_material_with_rng(&params, rng)?;
        Ok(Self { params, keys })
    }

    pub fn params(&self) -> &Arc<BfvParams> {
        &self.params
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn slot_count(&self) -> usize {
        self.params.slot_count()
    }

    /// Encrypt up to `slot_count()` values; remaining slots hold zero.
    pub fn encrypt(&self, slots: &[u64]) -> Result<BfvCiphertext, SchemeError> {
        let mut rng = ChaCha20Rng::from_os_rng();
        self.encrypt_with_rng(slots, &mut rng)
    }

    pub fn encrypt_with_rng<R: rand::Rng>(
        &self,
        slots: &[u64],
        rng: &mut R,
    ) -> Result<BfvCiphertext, SchemeError> {
        let pt = encode_slots(slots, &self.params)?;
        encrypt_pk_with_rng(&pt, &self.keys.public, rng)
    }

    /// All `slot_count()` slots.
    pub fn decrypt(&self, ct: &BfvCiphertext) -> Result<Vec<u64>, SchemeError> {
        let pt = decrypt(ct, &self.keys.secret)?;
        decode_slots(&pt, &self.params)
    }

    pub fn noise_budget(&self, ct: &BfvCiphertext) -> Result<u32, SchemeError> {
        noise_budget(ct, &self.keys.secret)
    }

    pub fn add(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        self.check_owned(a)?;
        bfv_add(a, b)
    }

    pub fn sub(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        self.check_owned(a)?;
        bfv_sub(a, b)
    }

    pub fn negate(&self, ct: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        self.check_owned(ct)?;
        Ok(bfv_neg(ct))
    }

    pub fn mul_scalar(&self, ct: &BfvCiphertext, scalar: u64) -> Result<BfvCiphertext, SchemeError> {
        self.check_owned(ct)?;
        Ok(bfv_mul_scalar(ct, scalar))
    }

    /// Slot-wise product, relinearized back to degree 1.
    pub fn multiply(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        bfv_mul_and_relin(a, b, &self.keys.relin)
    }

    /// Per-slot 1 - x.
    pub fn complement(&self, ct: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        self.check_owned(ct)?;
        bfv_complement(ct)
    }

    /// Apply X -> X^element. Only the trace elements have keys.
    pub fn apply_galois(&self, ct: &BfvCiphertext, element: usize) -> Result<BfvCiphertext, SchemeError> {
        bfv_apply_galois(ct, self.keys.galois.get(element)?)
    }

    /// Every slot of the result holds the sum of all slots of `ct`.
    pub fn cumulative_add(&self, ct: &BfvCiphertext) -> Result<BfvCiphertext, SchemeError> {
        bfv_cumulative_add(ct, &self.keys.galois)
    }

    fn check_owned(&self, ct: &BfvCiphertext) -> Result<(), SchemeError> {
        crate::bfv::check_same_context(&self.params, &ct.params)
    }
}
