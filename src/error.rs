use thiserror::Error;

/// Failures of the parameter search. Fatal: the search space is exhausted
/// deterministically, so retrying with the same inputs gives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("plaintext modulus needs {bits} bits, the scheme supports at most {max}")]
    ModulusTooLarge { bits: u32, max: u32 },

    #[error("ring dimension {ring_dimension} exceeds the maximum of {max}")]
    RingTooLarge { ring_dimension: usize, max: usize },

    #[error("unsupported security level: {0} (expected 128, 192 or 256)")]
    UnsupportedSecurityLevel(u32),

    #[error("maximum string length must be positive")]
    InvalidStringLength,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("character {character:?} (U+{code:04X}) does not fit in {char_length} bits")]
    CharacterOutOfRange {
        character: char,
        code: u32,
        char_length: usize,
    },

    #[error("vector of {len} bits is not a multiple of the {char_length}-bit character width")]
    MisalignedVector { len: usize, char_length: usize },

    #[error("character width must be between 1 and 32 bits, got {0}")]
    InvalidCharLength(usize),

    #[error("decoded value {0:#x} is not a Unicode scalar value")]
    InvalidCodePoint(u32),

    #[error("binary vector holds {value} at position {index}")]
    InvalidBit { index: usize, value: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("encrypted strings have {left} and {right} chunks")]
    ChunkCountMismatch { left: usize, right: usize },

    #[error("encrypted strings hold {left} and {right} bits")]
    BitLengthMismatch { left: usize, right: usize },

    #[error("a distance over {bits} bits can wrap the plaintext modulus {plain_modulus}")]
    DistanceOverflow { bits: usize, plain_modulus: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("matcher is not initialized")]
    NotInitialized,

    #[error("matcher is already initialized")]
    AlreadyInitialized,
}

/// Errors raised by the BFV provider itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("modulus mismatch")]
    ModulusMismatch,

    #[error("ring degree must be a power of 2, got {0}")]
    InvalidRingDegree(usize),

    #[error("no {bits}-bit prime p with p = 1 mod {}", .ring_degree * 2)]
    NoNttPrime { bits: u32, ring_degree: usize },

    #[error("no coefficient modulus for ring degree {ring_degree} at {security_bits}-bit security")]
    UnsupportedRing {
        ring_degree: usize,
        security_bits: u32,
    },

    #[error("ciphertext was produced under a different context")]
    ForeignCiphertext,

    #[error("key not available: {0}")]
    MissingKey(String),

    #[error("decryption error: noise budget exhausted")]
    DecryptionError,
}

/// Top-level error for matcher operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EsmError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Scheme(#[from] SchemeError),
}

pub type Result<T, E = EsmError> = std::result::Result<T, E>;
