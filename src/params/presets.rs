use std::sync::Arc;
use crate::error::SchemeError;
use crate::params::{BfvParams, BfvParamsBuilder, SecurityLevel};

/// Small parameters for fast tests and benches. Not secure.
///
/// n=1024, 17-bit plaintext modulus, two 50-bit ciphertext primes.
pub fn compact_bfv() -> Result<Arc<BfvParams>, SchemeError> {
    BfvParamsBuilder::new()
        .ring_degree(1024)
        .plain_modulus_bits(17)
        .coeff_modulus_bits(vec![50, 50])
        .build()
}

/// The context a default matcher ends up with: strings of 256 16-bit
/// characters at 128-bit security.
pub fn default_bfv() -> Result<Arc<BfvParams>, SchemeError> {
    BfvParams::generate(4096, 24, SecurityLevel::Bits128)
}
