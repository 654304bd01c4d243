//! Top-level SDK client
//!
//! ```rust,ignore
//! use airalo_domain::{OrderLine, PackageQuery, SdkConfig};
//! use airalo_infra::AiraloClient;
//!
//! let client = AiraloClient::new(SdkConfig::new(id, secret)).await?;
//! let packages = client.packages(&PackageQuery::country("DE").flat(true)).await?;
//! let results = client.order_bulk(&[OrderLine::new("pkg-a", 2)], None).await?;
//! ```

use std::sync::Arc;

use airalo_domain::constants::SDK_VERSION;
use airalo_domain::{EmailSimShare, OrderLine, PackageKind, PackageQuery, Result, SdkConfig};
use serde_json::Value;
use tracing::info;

use crate::bulk::BulkResults;
use crate::config;
use crate::http::{HttpExecutor, RequestMultiplexer, ReqwestTransport, Transport};
use crate::services::{
    AccessTokenProvider, OAuthService, OrderService, PackageListing, PackagesService,
    ServiceContext, SimService,
};

/// Entry point to the partner API.
///
/// Construction validates the configuration and fetches an access token,
/// so bad credentials fail here rather than on the first call.
#[derive(Debug, Clone)]
pub struct AiraloClient {
    config: Arc<SdkConfig>,
    executor: HttpExecutor,
    auth: Arc<OAuthService>,
    packages: PackagesService,
    orders: OrderService,
    sims: SimService,
}

impl AiraloClient {
    /// # Errors
    /// `AiraloError::Config` for invalid configuration,
    /// `AiraloError::TransportUnavailable` if no HTTP client can be built,
    /// `AiraloError::Auth` if no token can be obtained.
    pub async fn new(config: SdkConfig) -> Result<Self> {
        let transport =
            ReqwestTransport::builder().user_agent(format!("airalo-rust-sdk/{SDK_VERSION}")).build()?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Client configured by [`config::load`].
    ///
    /// # Errors
    /// Same as [`new`](Self::new), plus configuration loading errors.
    pub async fn from_env() -> Result<Self> {
        Self::new(config::load()?).await
    }

    /// Client over a caller-supplied transport.
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub async fn with_transport(config: SdkConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let executor = HttpExecutor::from_config(&config, transport);

        let auth = Arc::new(OAuthService::new(&config, executor.clone()));
        auth.access_token().await?;

        let ctx = ServiceContext::new(config.clone(), executor.clone(), auth.clone());
        info!(base_url = %config.base_url(), "Airalo client ready");

        Ok(Self {
            packages: PackagesService::new(ctx.clone()),
            orders: OrderService::new(ctx.clone()),
            sims: SimService::new(ctx),
            config,
            executor,
            auth,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Executor carrying the SDK and configured headers.
    pub fn executor(&self) -> &HttpExecutor {
        &self.executor
    }

    /// Fresh multiplexer over this client's executor, for ad-hoc fan-out.
    pub fn multiplexer(&self) -> RequestMultiplexer {
        RequestMultiplexer::new(self.executor.clone())
    }

    /// Current bearer token (cached).
    ///
    /// # Errors
    /// `AiraloError::Auth` if a new token is needed and cannot be obtained.
    pub async fn access_token(&self) -> Result<String> {
        self.auth.access_token().await
    }

    /* ---------------------------------------------------------------------- */
    /* Packages */
    /* ---------------------------------------------------------------------- */

    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn packages(&self, query: &PackageQuery) -> Result<Option<PackageListing>> {
        self.packages.packages(query).await
    }

    /// Every package, top-ups included.
    ///
    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn all_packages(
        &self,
        flat: bool,
        limit: Option<usize>,
        page: Option<u32>,
    ) -> Result<Option<PackageListing>> {
        self.packages(&PackageQuery::all().flat(flat).limit(limit).page(page)).await
    }

    /// SIM packages only, without top-ups.
    ///
    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn sim_packages(
        &self,
        flat: bool,
        limit: Option<usize>,
        page: Option<u32>,
    ) -> Result<Option<PackageListing>> {
        let query = PackageQuery::of_kind(PackageKind::Sim).flat(flat).limit(limit).page(page);
        self.packages(&query).await
    }

    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn local_packages(
        &self,
        flat: bool,
        limit: Option<usize>,
        page: Option<u32>,
    ) -> Result<Option<PackageListing>> {
        let query = PackageQuery::of_kind(PackageKind::Local).flat(flat).limit(limit).page(page);
        self.packages(&query).await
    }

    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn global_packages(
        &self,
        flat: bool,
        limit: Option<usize>,
        page: Option<u32>,
    ) -> Result<Option<PackageListing>> {
        let query = PackageQuery::of_kind(PackageKind::Global).flat(flat).limit(limit).page(page);
        self.packages(&query).await
    }

    /// Packages covering one country (ISO code, any case).
    ///
    /// # Errors
    /// See [`PackagesService::packages`].
    pub async fn country_packages(
        &self,
        country_code: &str,
        flat: bool,
        limit: Option<usize>,
    ) -> Result<Option<PackageListing>> {
        self.packages(&PackageQuery::country(country_code).flat(flat).limit(limit)).await
    }

    /* ---------------------------------------------------------------------- */
    /* Orders */
    /* ---------------------------------------------------------------------- */

    /// # Errors
    /// See [`OrderService::order`].
    pub async fn order(&self, line: &OrderLine, description: Option<&str>) -> Result<Value> {
        self.orders.order(line, description).await
    }

    /// # Errors
    /// See [`OrderService::order_async`].
    pub async fn order_async(
        &self,
        line: &OrderLine,
        webhook_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value> {
        self.orders.order_async(line, webhook_url, description).await
    }

    /// # Errors
    /// See [`OrderService::order_with_email_sim_share`].
    pub async fn order_with_email_sim_share(
        &self,
        line: &OrderLine,
        share: &EmailSimShare,
        description: Option<&str>,
    ) -> Result<Value> {
        self.orders.order_with_email_sim_share(line, share, description).await
    }

    /// # Errors
    /// See [`OrderService::order_bulk`].
    pub async fn order_bulk(
        &self,
        lines: &[OrderLine],
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.orders.order_bulk(lines, description).await
    }

    /// # Errors
    /// See [`OrderService::order_bulk_with_email_sim_share`].
    pub async fn order_bulk_with_email_sim_share(
        &self,
        lines: &[OrderLine],
        share: &EmailSimShare,
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.orders.order_bulk_with_email_sim_share(lines, share, description).await
    }

    /// # Errors
    /// See [`OrderService::order_async_bulk`].
    pub async fn order_async_bulk(
        &self,
        lines: &[OrderLine],
        webhook_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.orders.order_async_bulk(lines, webhook_url, description).await
    }

    /* ---------------------------------------------------------------------- */
    /* SIMs */
    /* ---------------------------------------------------------------------- */

    /// # Errors
    /// See [`SimService::usage`].
    pub async fn sim_usage(&self, iccid: &str) -> Result<Option<Value>> {
        self.sims.usage(iccid).await
    }

    /// # Errors
    /// See [`SimService::usage_bulk`].
    pub async fn sim_usage_bulk(&self, iccids: &[String]) -> Result<Option<BulkResults>> {
        self.sims.usage_bulk(iccids).await
    }
}
