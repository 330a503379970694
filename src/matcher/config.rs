use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, ParameterError, Result};
use crate::params::{SecurityLevel, DEFAULT_CHAR_LENGTH};

/// How the per-string bit sums enter the distance computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitSumPolicy {
    /// Everything stays encrypted until the final distance.
    #[default]
    Homomorphic,
    /// Decrypt each string's bit sum and re-encrypt it. Reveals the number
    /// of one bits of both inputs to the party computing the distance.
    DecryptIntermediate,
}

/// Matcher settings. Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Longest expected string, in characters.
    pub max_string_length: usize,
    pub security_level: SecurityLevel,
    /// Start the ring search at the smallest standard dimension.
    pub use_minimum_ring: bool,
    /// Bits per character.
    pub char_length: usize,
    pub bit_sum_policy: BitSumPolicy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_string_length: 256,
            security_level: SecurityLevel::Bits128,
            use_minimum_ring: true,
            char_length: DEFAULT_CHAR_LENGTH,
            bit_sum_policy: BitSumPolicy::Homomorphic,
        }
    }
}

impl MatcherConfig {
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    pub fn max_string_length(mut self, length: usize) -> Self {
        self.config.max_string_length = length;
        self
    }

    pub fn security_level(mut self, level: SecurityLevel) -> Self {
        self.config.security_level = level;
        self
    }

    pub fn use_minimum_ring(mut self, yes: bool) -> Self {
        self.config.use_minimum_ring = yes;
        self
    }

    pub fn char_length(mut self, bits: usize) -> Self {
        self.config.char_length = bits;
        self
    }

    pub fn bit_sum_policy(mut self, policy: BitSumPolicy) -> Self {
        self.config.bit_sum_policy = policy;
        self
    }

    pub fn build(self) -> Result<MatcherConfig> {
        if self.config.max_string_length == 0 {
            return Err(ParameterError::InvalidStringLength.into());
        }
        if !(1..=32).contains(&self.config.char_length) {
            return Err(EncodingError::InvalidCharLength(self.config.char_length).into());
        }
        Ok(self.config)
    }
}
