//! # esm: Encrypted String Matching
//!
//! Decides whether two strings are equal while they stay encrypted under the
//! BFV homomorphic encryption scheme.
//!
//! Strings are encoded as fixed-width bit vectors and packed into the n
//! plaintext slots of BFV ciphertexts. Equality is the test
//! `HD(A, B) == 0`, where the Hamming distance
//! HD(A, B) = |A| + |B| - 2·|A ∧ B| is evaluated homomorphically with one
//! ciphertext multiplication and a rotate-and-sum over the slots. Only the
//! distance is ever decrypted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use esm::prelude::*;
//!
//! // Parameters for strings of up to 256 characters at 128-bit security
//! let matcher = Matcher::ready(MatcherConfig::default())?;
//!
//! let a = matcher.encrypt_str("hello world")?;
//! let b = matcher.encrypt_str("hello world")?;
//! let c = matcher.encrypt_str("bye world")?;
//!
//! assert!(matcher.equal(&a, &b)?);
//! assert!(!matcher.equal(&a, &c)?);
//! # Ok::<(), esm::error::EsmError>(())
//! ```
//!
//! The layers below the matcher are usable on their own: [`params`] selects
//! parameters, [`bfv`] is the encryption scheme and [`ring`] the polynomial
//! arithmetic it runs on.

pub mod error;
pub mod params;
pub mod ring;
pub mod sampling;
pub mod bfv;
pub mod matcher;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::error::{
        EncodingError, EsmError, ParameterError, Result, SchemeError, ShapeError, StateError,
    };
    pub use crate::params::{select, BfvParams, BfvParamsBuilder, SchemeParameters, SecurityLevel};
    pub use crate::bfv::{BfvCiphertext, BfvScheme};
    pub use crate::matcher::{
        decode_string, encode_string, BinaryVector, BitSumPolicy, EncryptedString, Matcher,
        MatcherConfig, MatcherConfigBuilder,
    };
}
