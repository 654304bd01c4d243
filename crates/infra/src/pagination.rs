//! Sequential page sweeps over list endpoints
//!
//! List endpoints answer `{ "data": [...], "meta": { "last_page": N } }`.
//! [`PaginationDriver::collect`] walks pages in order and concatenates the
//! `data` arrays.

use airalo_domain::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::{HttpExecutor, RequestSpec};

/// Where a sweep begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStart {
    /// First call carries no `page` parameter; the answer counts as the page
    /// the API reports (page 1 when it reports none).
    Unpaged,
    Page(u32),
}

impl PageStart {
    /// `None` starts at page 1, `Some(0)` sends no page parameter first.
    pub fn from_requested(page: Option<u32>) -> Self {
        match page {
            None => Self::Page(1),
            Some(0) => Self::Unpaged,
            Some(page) => Self::Page(page),
        }
    }
}

/// Result of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Pages {
    /// The first request produced no response at all.
    NoData,
    Items(Vec<Value>),
}

impl Pages {
    /// Items, or `None` for [`Pages::NoData`] and empty sweeps.
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Self::Items(items) if !items.is_empty() => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageBody {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    last_page: Value,
    #[serde(default)]
    current_page: Value,
}

fn as_page(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Drives a page sweep through an [`HttpExecutor`].
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    executor: HttpExecutor,
}

impl PaginationDriver {
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// Fetch pages of `spec` from `start` until one of:
    /// - a page has an empty `data` array
    /// - a page fails (non-2xx, no response, or not a page body)
    /// - at least `limit` items have been accumulated (the last page is kept
    ///   whole)
    /// - the page just fetched is the last page the API reports
    ///
    /// # Errors
    /// Returns a preparation error if `spec` is invalid, or
    /// `AiraloError::Transport` on a transport fault.
    pub async fn collect(
        &self,
        spec: &RequestSpec,
        start: PageStart,
        limit: Option<usize>,
    ) -> Result<Pages> {
        let mut page = match start {
            PageStart::Unpaged => None,
            PageStart::Page(page) => Some(page),
        };
        let mut items = Vec::new();
        let mut first = true;

        loop {
            let page_spec = match page {
                Some(page) => spec.clone().query_param("page", page.to_string()),
                None => spec.clone(),
            };

            let raw = self.executor.send(&page_spec).await?;
            if raw.is_unavailable() {
                if first {
                    return Ok(Pages::NoData);
                }
                warn!(url = spec.url(), ?page, "page request produced no response; stopping sweep");
                break;
            }

            if !raw.is_success() {
                warn!(url = spec.url(), ?page, status = raw.status(), "page request failed; stopping sweep");
                break;
            }

            let body: PageBody = match raw.json() {
                Ok(body) => body,
                Err(err) => {
                    warn!(url = spec.url(), ?page, error = %err, "page body is not a page; stopping sweep");
                    break;
                }
            };
            first = false;

            let data = match body.data {
                Value::Array(data) if !data.is_empty() => data,
                _ => break,
            };
            items.extend(data);

            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }

            let current = page.or_else(|| as_page(&body.meta.current_page)).unwrap_or(1);
            if as_page(&body.meta.last_page).is_some_and(|last| current >= last) {
                break;
            }

            let Some(next) = current.checked_add(1) else {
                warn!(url = spec.url(), current, "page counter exhausted; stopping sweep");
                break;
            };
            page = Some(next);
        }

        debug!(url = spec.url(), items = items.len(), "page sweep finished");
        Ok(Pages::Items(items))
    }
}
