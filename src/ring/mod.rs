pub mod modular;
pub mod ntt;
pub mod poly;
pub mod rns;

pub use modular::{barrett_reduce, find_ntt_primes, is_prime, mod_add, mod_mul, mod_neg, mod_sub};
pub use ntt::NttPoly;
pub use poly::CoeffPoly;
pub use rns::{RnsBasis, RnsPoly};
