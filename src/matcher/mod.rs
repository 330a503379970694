//! The string matcher: one owned BFV context, string encoding, chunked
//! encryption and the encrypted equality test.

pub mod config;
pub mod distance;
pub mod encoding;

pub use config::{BitSumPolicy, MatcherConfig, MatcherConfigBuilder};
pub use encoding::{decode_string, encode_string, BinaryVector};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::bfv::{BfvCiphertext, BfvScheme};
use crate::error::{Result, SchemeError, StateError};
use crate::params::select::select_context;
use crate::params::SchemeParameters;

/// Ciphertext chunks of one encoded string, in order.
///
/// Each chunk holds up to `slot_count` bits; `chunk_lens` records how many
/// leading slots of each chunk are meaningful. The remaining slots are zero.
#[derive(Clone, Debug)]
pub struct EncryptedString {
    chunks: Vec<BfvCiphertext>,
    chunk_lens: Vec<usize>,
}

impl EncryptedString {
    pub fn chunks(&self) -> &[BfvCiphertext] {
        &self.chunks
    }

    pub fn chunk_lens(&self) -> &[usize] {
        &self.chunk_lens
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of encrypted bits.
    pub fn bit_len(&self) -> usize {
        self.chunk_lens.iter().sum()
    }
}

/// Lifecycle of a [`Matcher`].
pub enum MatcherState {
    Uninitialized,
    Ready(Box<MatcherContext>),
}

/// Parameters and keys owned by an initialized matcher.
pub struct MatcherContext {
    pub parameters: SchemeParameters,
    pub scheme: BfvScheme,
}

/// Encrypted string equality over BFV.
///
/// ```no_run
/// use esm::prelude::*;
///
/// let matcher = Matcher::ready(MatcherConfig::default())?;
/// let a = matcher.encrypt_str("hello world")?;
/// let b = matcher.encrypt_str("hello world")?;
/// assert!(matcher.equal(&a, &b)?);
/// # Ok::<(), esm::error::EsmError>(())
/// ```
pub struct Matcher {
    config: MatcherConfig,
    state: MatcherState,
}

impl Matcher {
    /// An uninitialized matcher. Call [`Matcher::initialize`] before use.
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            state: MatcherState::Uninitialized,
        }
    }

    /// Build and initialize in one step.
    pub fn ready(config: MatcherConfig) -> Result<Self> {
        let mut matcher = Self::new(config);
        matcher.initialize()?;
        Ok(matcher)
    }

    /// Select parameters and generate all key material.
    ///
    /// Keys stay bound to one parameter set, so a second call fails with
    /// [`StateError::AlreadyInitialized`].
    pub fn initialize(&mut self) -> Result<()> {
        if let MatcherState::Ready(_) = self.state {
            return Err(StateError::AlreadyInitialized.into());
        }

        let (parameters, params) = select_context(
            self.config.max_string_length,
            self.config.char_length,
            self.config.security_level,
            self.config.use_minimum_ring,
        )?;
        let scheme = BfvScheme::new(params)?;
        info!(
            ring_dimension = parameters.ring_dimension,
            plaintext_modulus_bits = parameters.plaintext_modulus_bits,
            security = parameters.security_level.bits(),
            "matcher initialized"
        );

        self.state = MatcherState::Ready(Box::new(MatcherContext { parameters, scheme }));
        Ok(())
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn state(&self) -> &MatcherState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, MatcherState::Ready(_))
    }

    fn context(&self) -> Result<&MatcherContext, StateError> {
        match &self.state {
            MatcherState::Ready(ctx) => Ok(ctx.as_ref()),
            MatcherState::Uninitialized => Err(StateError::NotInitialized),
        }
    }

    pub fn parameters(&self) -> Result<SchemeParameters> {
        Ok(self.context()?.parameters)
    }

    pub fn slot_count(&self) -> Result<usize> {
        Ok(self.context()?.scheme.slot_count())
    }

    pub fn encode(&self, text: &str) -> Result<BinaryVector> {
        self.context()?;
        Ok(encode_string(text, self.config.char_length)?)
    }

    pub fn decode(&self, vector: &BinaryVector) -> Result<String> {
        self.context()?;
        Ok(decode_string(vector, self.config.char_length)?)
    }

    /// Encrypt `vector` in chunks of `slot_count` bits.
    pub fn encrypt(&self, vector: &BinaryVector) -> Result<EncryptedString> {
        let scheme = &self.context()?.scheme;
        let slot_count = scheme.slot_count();

        let (chunks, chunk_lens): (Vec<_>, Vec<_>) = vector.bits()
            .par_chunks(slot_count)
            .map(|bits| {
                let slots: Vec<u64> = bits.iter().map(|&b| u64::from(b)).collect();
                scheme.encrypt(&slots).map(|ct| (ct, bits.len()))
            })
            .collect::<Result<Vec<_>, SchemeError>>()?
            .into_iter()
            .unzip();

        debug!(bits = vector.len(), chunks = chunks.len(), "encrypted vector");
        Ok(EncryptedString { chunks, chunk_lens })
    }

    /// Decrypt every chunk and concatenate the meaningful slots.
    pub fn decrypt(&self, enc: &EncryptedString) -> Result<BinaryVector> {
        let scheme = &self.context()?.scheme;

        let parts = enc.chunks
            .par_iter()
            .zip(enc.chunk_lens.par_iter())
            .map(|(ct, &len)| -> Result<BinaryVector> {
                let slots = scheme.decrypt(ct)?;
                let meaningful = slots.get(..len).ok_or(SchemeError::DecryptionError)?;
                BinaryVector::from_slots(meaningful).map_err(|_| SchemeError::DecryptionError.into())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut vector = BinaryVector::default();
        for part in parts {
            vector.extend_from(part);
        }
        Ok(vector)
    }

    pub fn encrypt_str(&self, text: &str) -> Result<EncryptedString> {
        self.encrypt(&self.encode(text)?)
    }

    pub fn decrypt_str(&self, enc: &EncryptedString) -> Result<String> {
        self.decode(&self.decrypt(enc)?)
    }

    /// Hamming distance between the encrypted bit vectors, revealing only
    /// the distance.
    ///
    /// Both strings must have the same bit length, otherwise this fails
    /// with [`crate::error::ShapeError::BitLengthMismatch`].
    pub fn hamming_distance(&self, a: &EncryptedString, b: &EncryptedString) -> Result<u64> {
        let ctx = self.context()?;
        distance::check_same_shape(a, b)?;
        distance::hamming_distance(&ctx.scheme, self.config.bit_sum_policy, a, b)
    }

    /// True iff both strings encrypt the same bits.
    ///
    /// Strings of different lengths with the same chunk count compare as
    /// not equal; the padded distance is still computed.
    pub fn equal(&self, a: &EncryptedString, b: &EncryptedString) -> Result<bool> {
        let ctx = self.context()?;
        let distance = distance::hamming_distance(&ctx.scheme, self.config.bit_sum_policy, a, b)?;
        Ok(distance == 0 && a.bit_len() == b.bit_len())
    }

    /// Smallest remaining noise budget over the chunks, in bits.
    pub fn noise_budget(&self, enc: &EncryptedString) -> Result<u32> {
        let scheme = &self.context()?.scheme;
        let mut budget = u32::MAX;
        for ct in &enc.chunks {
            budget = budget.min(scheme.noise_budget(ct)?);
        }
        Ok(budget)
    }
}
