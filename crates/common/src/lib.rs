//! Common utilities shared across the Airalo SDK crates.
//!
//! - `crypto::signature`: HMAC-SHA512 payload signing for the
//!   `airalo-signature` header
//! - `crypto::digest`: SHA-256 digests used as cache keys

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod crypto;

pub use crypto::{sha256_hex, Signature};
