//! # Airalo Domain
//!
//! Domain types for the Airalo partner API SDK.
//!
//! This crate contains:
//! - The SDK error type and Result alias
//! - SDK configuration and environment selection
//! - API constants and limits
//! - Order, package and SIM request types with per-item validation
//!
//! ## Architecture
//! - No dependencies on other SDK crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
