pub mod keygen;
pub mod encrypt;
pub mod eval;
pub mod encoding;
pub mod keyswitch;
pub mod scheme;

pub use keygen::{
    GaloisKey, GaloisKeys, KeyMaterial, KeySwitchKey, PublicKey, RelinKey, SecretKey,
    trace_galois_elements,
};
pub use encrypt::{decrypt, encrypt_pk, encrypt_pk_with_rng, noise_budget};
pub use eval::{
    bfv_add, bfv_add_plain, bfv_apply_galois, bfv_complement, bfv_cumulative_add,
    bfv_mul_and_relin, bfv_mul_scalar, bfv_neg, bfv_sub,
};
pub use encoding::{decode_slots, encode_broadcast, encode_slots};
pub use scheme::BfvScheme;

use std::sync::Arc;
use crate::error::SchemeError;
use crate::params::BfvParams;
use crate::ring::rns::RnsPoly;

/// A BFV ciphertext: (c0, c1, ..., c_k) where k=1 for fresh, k=2 after mul (before relin).
#[derive(Clone, Debug)]
pub struct BfvCiphertext {
    /// Ciphertext components. Typically 2 (c0, c1) or 3 after multiplication.
    pub c: Vec<RnsPoly>,
    /// Associated parameters.
    pub params: Arc<BfvParams>,
}

impl BfvCiphertext {
    pub fn degree(&self) -> usize {
        self.c.len().saturating_sub(1)
    }
}

/// Objects from two contexts never mix, even if their parameters agree.
pub(crate) fn check_same_context(a: &Arc<BfvParams>, b: &Arc<BfvParams>) -> Result<(), SchemeError> {
    if Arc::ptr_eq(a, b) {
        Ok(())
    } else {
        Err(SchemeError::ForeignCiphertext)
    }
}
