pub mod gaussian;
pub mod uniform;

pub use gaussian::{sample_gaussian, CdtTable};
pub use uniform::{sample_binary, sample_ternary, sample_uniform_rns};
