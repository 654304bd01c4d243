//! SIM usage lookups

use std::time::Duration;

use airalo_domain::constants::{BULK_USAGE_LIMIT, SIMS_SLUG, SIMS_USAGE_SLUG};
use airalo_domain::{validate_iccid, AiraloError, Result};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{has_no_data, ServiceContext};
use crate::bulk::{BulkOrchestrator, BulkResults};
use crate::cache::{ResponseCache, ResponseCacheConfig};
use crate::http::RequestSpec;

/// `GET sims/{iccid}/usage`.
#[derive(Debug, Clone)]
pub struct SimService {
    ctx: ServiceContext,
    bulk: BulkOrchestrator,
    cache: ResponseCache<Value>,
}

impl SimService {
    pub fn new(ctx: ServiceContext) -> Self {
        let ttl = Duration::from_secs(ctx.config().usage_cache_ttl_secs);
        let bulk = BulkOrchestrator::new(ctx.executor().clone())
            .with_max_batch(BULK_USAGE_LIMIT)
            .with_window(Some(ctx.config().window));
        Self { bulk, cache: ResponseCache::new("sim_usage", ResponseCacheConfig::with_ttl(ttl)), ctx }
    }

    fn usage_url(&self, iccid: &str) -> String {
        self.ctx.url(&format!("{SIMS_SLUG}/{iccid}/{SIMS_USAGE_SLUG}"))
    }

    /// Data usage of one SIM.
    ///
    /// Returns `Ok(None)` when the API reports no usage data or does not
    /// answer.
    ///
    /// # Errors
    /// `AiraloError::Validation` for a malformed ICCID, `AiraloError::Api`
    /// for a non-2xx answer.
    #[instrument(skip(self))]
    pub async fn usage(&self, iccid: &str) -> Result<Option<Value>> {
        validate_iccid(iccid)?;

        let token = self.ctx.access_token().await?;
        let spec = self.ctx.authorized(RequestSpec::get(self.usage_url(iccid)), &token);
        let key = ResponseCache::<Value>::key([spec.url(), token.as_str()]);

        self.cache
            .get_or_fetch(key, || async {
                let raw = self.ctx.executor().send(&spec).await?;
                if raw.is_unavailable() {
                    debug!(iccid, "usage request produced no response");
                    return Ok(None);
                }

                if !raw.is_success() {
                    return Err(AiraloError::Api { status: raw.status(), body: raw.text() });
                }

                let body: Value = raw.json()?;
                Ok((!has_no_data(&body)).then_some(body))
            })
            .await
    }

    /// Usage of several SIMs concurrently, keyed by ICCID.
    ///
    /// Returns `Ok(None)` for an empty list.
    ///
    /// # Errors
    /// `AiraloError::BatchTooLarge` or `AiraloError::Validation` before any
    /// request is sent.
    #[instrument(skip_all, fields(iccids = iccids.len()))]
    pub async fn usage_bulk(&self, iccids: &[String]) -> Result<Option<BulkResults>> {
        if iccids.is_empty() {
            return Ok(None);
        }

        if iccids.len() > BULK_USAGE_LIMIT {
            return Err(AiraloError::BatchTooLarge { size: iccids.len(), max: BULK_USAGE_LIMIT });
        }

        for iccid in iccids {
            validate_iccid(iccid)?;
        }

        let token = self.ctx.access_token().await?;
        self.bulk
            .dispatch(iccids, |iccid| {
                let spec = self.ctx.authorized(RequestSpec::get(self.usage_url(iccid)), &token);
                Ok((iccid.clone(), spec))
            })
            .await
    }
}
