//! Encrypted Hamming distance.
//!
//! For bit vectors A and B, HD(A, B) = |A| + |B| - 2·|A ∧ B|, where |·|
//! counts one bits. Slot-wise, a + b - 2ab is the XOR of the two bits, so
//! summing it over all slots of all chunks yields the distance.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bfv::{BfvCiphertext, BfvScheme};
use crate::error::{Result, SchemeError, ShapeError};
use crate::matcher::{BitSumPolicy, EncryptedString};

/// Both strings must have the same chunk layout for their distance to be
/// a Hamming distance. Checked before any homomorphic work.
pub(crate) fn check_same_shape(a: &EncryptedString, b: &EncryptedString) -> Result<(), ShapeError> {
    if a.chunk_count() != b.chunk_count() {
        return Err(ShapeError::ChunkCountMismatch {
            left: a.chunk_count(),
            right: b.chunk_count(),
        });
    }
    if a.chunk_lens() != b.chunk_lens() {
        return Err(ShapeError::BitLengthMismatch {
            left: a.bit_len(),
            right: b.bit_len(),
        });
    }
    Ok(())
}

/// Distance over zero-padded chunks. Chunk lengths may differ.
pub(crate) fn hamming_distance(
    scheme: &BfvScheme,
    policy: BitSumPolicy,
    a: &EncryptedString,
    b: &EncryptedString,
) -> Result<u64> {
    if a.chunk_count() != b.chunk_count() {
        return Err(ShapeError::ChunkCountMismatch {
            left: a.chunk_count(),
            right: b.chunk_count(),
        }
        .into());
    }
    if a.chunk_count() == 0 {
        return Ok(0);
    }

    let bits = a.bit_len().max(b.bit_len());
    let plain_modulus = scheme.params().plain_modulus;
    if bits as u64 >= plain_modulus / 2 {
        return Err(ShapeError::DistanceOverflow { bits, plain_modulus }.into());
    }

    debug!(chunks = a.chunk_count(), ?policy, "computing encrypted hamming distance");
    let products = a.chunks()
        .par_iter()
        .zip(b.chunks().par_iter())
        .map(|(x, y)| scheme.multiply(x, y))
        .collect::<Result<Vec<_>, SchemeError>>()?;

    let combined = match policy {
        BitSumPolicy::Homomorphic => xor_sum(scheme, a, b, &products)?,
        BitSumPolicy::DecryptIntermediate => leaky_combination(scheme, a, b, &products)?,
    };

    let slots = scheme.decrypt(&combined)?;
    let distance = slots.first().copied().ok_or(SchemeError::DecryptionError)?;
    if distance > bits as u64 {
        return Err(SchemeError::DecryptionError.into());
    }
    Ok(distance)
}

/// Σ_i (a_i + b_i - 2·a_i·b_i), reduced over slots with one trace.
fn xor_sum(
    scheme: &BfvScheme,
    a: &EncryptedString,
    b: &EncryptedString,
    products: &[BfvCiphertext],
) -> Result<BfvCiphertext, SchemeError> {
    let chunk_xors = a.chunks()
        .par_iter()
        .zip(b.chunks().par_iter())
        .zip(products.par_iter())
        .map(|((x, y), xy)| -> Result<BfvCiphertext, SchemeError> {
            scheme.sub(&scheme.add(x, y)?, &scheme.mul_scalar(xy, 2)?)
        })
        .collect::<Result<Vec<_>, SchemeError>>()?;

    let total = sum_all(scheme, &chunk_xors)?;
    scheme.cumulative_add(&total)
}

/// |A| + |B| - 2·c_sp with |A| and |B| decrypted and re-encrypted.
fn leaky_combination(
    scheme: &BfvScheme,
    a: &EncryptedString,
    b: &EncryptedString,
    products: &[BfvCiphertext],
) -> Result<BfvCiphertext, SchemeError> {
    warn!("bit-sum policy decrypts intermediate sums; the Hamming weight of each string is revealed");

    let t = scheme.params().plain_modulus;
    let c_sp = scheme.cumulative_add(&sum_all(scheme, products)?)?;
    let weight_a = plaintext_weight(scheme, a)? % t;
    let weight_b = plaintext_weight(scheme, b)? % t;

    let sum_a = scheme.encrypt(&[weight_a])?;
    let sum_b = scheme.encrypt(&[weight_b])?;
    scheme.sub(&scheme.add(&sum_a, &sum_b)?, &scheme.mul_scalar(&c_sp, 2)?)
}

fn plaintext_weight(scheme: &BfvScheme, s: &EncryptedString) -> Result<u64, SchemeError> {
    s.chunks()
        .iter()
        .zip(s.chunk_lens())
        .try_fold(0u64, |acc, (ct, &len)| {
            let slots = scheme.decrypt(ct)?;
            Ok(acc + slots.iter().take(len).sum::<u64>())
        })
}

fn sum_all(scheme: &BfvScheme, cts: &[BfvCiphertext]) -> Result<BfvCiphertext, SchemeError> {
    let (first, rest) = cts.split_first()
        .ok_or_else(|| SchemeError::InvalidParam("nothing to sum".into()))?;
    rest.iter().try_fold(first.clone(), |acc, ct| scheme.add(&acc, ct))
}
