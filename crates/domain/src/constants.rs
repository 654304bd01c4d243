//! SDK constants
//!
//! Centralized location for API endpoints, limits and defaults used
//! throughout the SDK.

// API endpoints
pub const SANDBOX_URL: &str = "https://sandbox-partners-api.airalo.com/v2/";
pub const PRODUCTION_URL: &str = "https://partners-api.airalo.com/v2/";

pub const TOKEN_SLUG: &str = "token";
pub const PACKAGES_SLUG: &str = "packages";
pub const ORDERS_SLUG: &str = "orders";
pub const ASYNC_ORDERS_SLUG: &str = "orders-async";
pub const SIMS_SLUG: &str = "sims";
pub const SIMS_USAGE_SLUG: &str = "usage";

// SDK identification
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SDK_HEADER_NAME: &str = "airalo-rust-sdk";
pub const SIGNATURE_HEADER_NAME: &str = "airalo-signature";

// Limits
pub const BULK_ORDER_LIMIT: usize = 50;
pub const ORDER_QUANTITY_LIMIT: u32 = 50;
pub const BULK_USAGE_LIMIT: usize = 50;

// Multiplexer
pub const DEFAULT_WINDOW: usize = 5;
pub const MAX_WINDOW: usize = 50;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// Timeouts and caching
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const PACKAGES_CACHE_TTL_SECS: u64 = 3600;
pub const USAGE_CACHE_TTL_SECS: u64 = 300;
pub const TOKEN_CACHE_TTL_SECS: u64 = 86_400;

// Token acquisition
pub const TOKEN_RETRY_LIMIT: usize = 2;
pub const TOKEN_RETRY_DELAY_MS: u64 = 500;

pub const DEFAULT_BULK_DESCRIPTION: &str = "Bulk order placed via Airalo Rust SDK";
pub const DEFAULT_ORDER_DESCRIPTION: &str = "Order placed via Airalo Rust SDK";
