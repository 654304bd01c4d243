//! Shared cryptographic primitives: request signing and cache-key digests.

pub mod digest;
pub mod signature;

pub use digest::sha256_hex;
pub use signature::Signature;
