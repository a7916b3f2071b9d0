//! Hash and signature primitives consumed by the revocation checkers.
//!
//! Everything in here is CPU-bound and lock-free; callers must not invoke
//! these while holding cache locks.

mod hash;
mod signature;

pub use hash::{HashAlgorithm, hash};
pub use signature::{SignatureError, SignatureVerifier, X509SignatureVerifier};
