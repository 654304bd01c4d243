//! eSIM orders: single, asynchronous and bulk

use airalo_domain::constants::{
    ASYNC_ORDERS_SLUG, BULK_ORDER_LIMIT, DEFAULT_ORDER_DESCRIPTION, ORDERS_SLUG,
};
use airalo_domain::{AiraloError, EmailSimShare, OrderLine, OrderPayload, Result};
use serde_json::Value;
use tracing::{info, instrument};

use super::{expect_status, ServiceContext};
use crate::bulk::{BulkOrchestrator, BulkResults};

/// `POST orders` and `POST orders-async`.
#[derive(Debug, Clone)]
pub struct OrderService {
    ctx: ServiceContext,
    bulk: BulkOrchestrator,
}

impl OrderService {
    pub fn new(ctx: ServiceContext) -> Self {
        let bulk = BulkOrchestrator::new(ctx.executor().clone())
            .with_max_batch(BULK_ORDER_LIMIT)
            .with_window(Some(ctx.config().window));
        Self { ctx, bulk }
    }

    /// Place one order and wait for it to be fulfilled.
    ///
    /// # Errors
    /// `AiraloError::Validation` for an invalid line, `AiraloError::Api`
    /// unless the API answers `200`.
    #[instrument(skip(self, line), fields(package_id = %line.package_id))]
    pub async fn order(&self, line: &OrderLine, description: Option<&str>) -> Result<Value> {
        let payload =
            OrderPayload::sim(line, Some(description.unwrap_or(DEFAULT_ORDER_DESCRIPTION)));
        payload.validate()?;

        let token = self.ctx.access_token().await?;
        let spec = self.ctx.signed_post(self.ctx.url(ORDERS_SLUG), &payload, &token)?;
        let raw = self.ctx.executor().send(&spec).await?;

        let body = expect_status(&raw, 200, "order")?;
        info!(package_id = %payload.package_id, quantity = payload.quantity, "order placed");
        Ok(body)
    }

    /// Place one order and have the eSIM emailed as described by `share`.
    ///
    /// # Errors
    /// `AiraloError::Validation` for an invalid line or share,
    /// `AiraloError::Api` unless the API answers `200`.
    #[instrument(skip(self, line, share, description), fields(package_id = %line.package_id))]
    pub async fn order_with_email_sim_share(
        &self,
        line: &OrderLine,
        share: &EmailSimShare,
        description: Option<&str>,
    ) -> Result<Value> {
        share.validate()?;
        let payload = OrderPayload::sim(line, Some(description.unwrap_or(DEFAULT_ORDER_DESCRIPTION)))
            .with_email_share(share);
        payload.validate()?;

        let token = self.ctx.access_token().await?;
        let spec = self.ctx.signed_post(self.ctx.url(ORDERS_SLUG), &payload, &token)?;
        let raw = self.ctx.executor().send(&spec).await?;

        let body = expect_status(&raw, 200, "order")?;
        info!(
            package_id = %payload.package_id,
            recipients = 1 + share.copy_address.len(),
            "order placed with email share"
        );
        Ok(body)
    }

    /// Submit an order for asynchronous fulfilment; the result is delivered
    /// to `webhook_url`.
    ///
    /// # Errors
    /// `AiraloError::Validation` for an invalid line, `AiraloError::Api`
    /// unless the API answers `202`.
    #[instrument(skip(self, line, description), fields(package_id = %line.package_id))]
    pub async fn order_async(
        &self,
        line: &OrderLine,
        webhook_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value> {
        let payload = OrderPayload::sim(line, Some(description.unwrap_or(DEFAULT_ORDER_DESCRIPTION)))
            .with_webhook(webhook_url);
        payload.validate()?;

        let token = self.ctx.access_token().await?;
        let spec = self.ctx.signed_post(self.ctx.url(ASYNC_ORDERS_SLUG), &payload, &token)?;
        let raw = self.ctx.executor().send(&spec).await?;

        let body = expect_status(&raw, 202, "async order")?;
        info!(package_id = %payload.package_id, "async order accepted");
        Ok(body)
    }

    /// Place one order per line concurrently, keyed by package id.
    ///
    /// Returns `Ok(None)` for an empty batch. Per-line API failures are
    /// reported in the results, not as an error.
    ///
    /// # Errors
    /// `AiraloError::BatchTooLarge` or `AiraloError::Validation` before any
    /// request is sent.
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub async fn order_bulk(
        &self,
        lines: &[OrderLine],
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.dispatch(ORDERS_SLUG, lines, None, None, description).await
    }

    /// [`order_bulk`](Self::order_bulk) with every line's eSIM emailed as
    /// described by `share`.
    ///
    /// # Errors
    /// Same as [`order_bulk`](Self::order_bulk), plus
    /// `AiraloError::Validation` for an invalid share.
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub async fn order_bulk_with_email_sim_share(
        &self,
        lines: &[OrderLine],
        share: &EmailSimShare,
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.dispatch(ORDERS_SLUG, lines, None, Some(share), description).await
    }

    /// Asynchronous variant of [`order_bulk`](Self::order_bulk).
    ///
    /// # Errors
    /// Same as [`order_bulk`](Self::order_bulk).
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub async fn order_async_bulk(
        &self,
        lines: &[OrderLine],
        webhook_url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        self.dispatch(ASYNC_ORDERS_SLUG, lines, webhook_url, None, description).await
    }

    async fn dispatch(
        &self,
        slug: &str,
        lines: &[OrderLine],
        webhook_url: Option<&str>,
        share: Option<&EmailSimShare>,
        description: Option<&str>,
    ) -> Result<Option<BulkResults>> {
        if lines.is_empty() {
            return Ok(None);
        }

        if lines.len() > BULK_ORDER_LIMIT {
            return Err(AiraloError::BatchTooLarge { size: lines.len(), max: BULK_ORDER_LIMIT });
        }

        if let Some(share) = share {
            share.validate()?;
        }

        let payloads = lines
            .iter()
            .map(|line| {
                let mut payload = OrderPayload::sim(line, description).with_webhook(webhook_url);
                if let Some(share) = share {
                    payload = payload.with_email_share(share);
                }
                payload.validate().map(|()| payload)
            })
            .collect::<Result<Vec<_>>>()?;

        let token = self.ctx.access_token().await?;
        let url = self.ctx.url(slug);
        self.bulk
            .dispatch(&payloads, |payload| {
                let spec = self.ctx.signed_post(url.clone(), payload, &token)?;
                Ok((payload.package_id.clone(), spec))
            })
            .await
    }
}
