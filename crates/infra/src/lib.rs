//! # Airalo Infrastructure
//!
//! I/O side of the Airalo partner SDK.
//!
//! This crate contains:
//! - HTTP plumbing: request specs, the reqwest transport, the single
//!   request executor and the rolling-window [`RequestMultiplexer`]
//! - Pagination and bulk fan-out built on the multiplexer
//! - Partner API services (auth, packages, orders, SIM usage)
//! - Configuration loading, response caching and logging setup
//!
//! ## Architecture
//! - Types, constants and errors come from `airalo-domain`
//! - Payload signing and digests come from `airalo-common`
//! - [`AiraloClient`] wires everything together

pub mod bulk;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod pagination;
pub mod services;

pub use bulk::{BulkEntry, BulkOrchestrator, BulkResults};
pub use cache::{ResponseCache, ResponseCacheConfig};
pub use client::AiraloClient;
pub use errors::InfraError;
pub use http::*;
pub use logging::{init_logging, LoggingConfig};
pub use pagination::{PageStart, Pages, PaginationDriver};
pub use services::{
    AccessTokenProvider, OAuthService, OrderService, PackageListing, PackagesService,
    ServiceContext, SimService,
};
