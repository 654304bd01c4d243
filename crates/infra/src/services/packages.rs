//! Package catalog listing

use std::time::Duration;

use airalo_domain::constants::PACKAGES_SLUG;
use airalo_domain::{AiraloError, CatalogEntry, FlatPackage, PackageQuery, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::ServiceContext;
use crate::cache::{ResponseCache, ResponseCacheConfig};
use crate::errors::InfraError;
use crate::http::RequestSpec;
use crate::pagination::{PageStart, PaginationDriver};

/// Catalog rows as returned by the API, or flattened to one row per package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PackageListing {
    Nested(Vec<Value>),
    Flat(Vec<FlatPackage>),
}

impl PackageListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Nested(rows) => rows.len(),
            Self::Flat(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `GET packages`, swept across pages and cached.
#[derive(Debug, Clone)]
pub struct PackagesService {
    ctx: ServiceContext,
    pagination: PaginationDriver,
    cache: ResponseCache<PackageListing>,
}

impl PackagesService {
    pub fn new(ctx: ServiceContext) -> Self {
        let ttl = Duration::from_secs(ctx.config().packages_cache_ttl_secs);
        Self {
            pagination: PaginationDriver::new(ctx.executor().clone()),
            cache: ResponseCache::new("packages", ResponseCacheConfig::with_ttl(ttl)),
            ctx,
        }
    }

    /// List packages matching `query`.
    ///
    /// Returns `Ok(None)` when the API has no matching packages or does not
    /// answer the first page.
    ///
    /// # Errors
    /// Token acquisition errors, `AiraloError::Serialization` when flattening
    /// meets rows that are not catalog entries, or a transport fault.
    #[instrument(skip(self, query), fields(kind = %query.kind, country = ?query.country))]
    pub async fn packages(&self, query: &PackageQuery) -> Result<Option<PackageListing>> {
        let token = self.ctx.access_token().await?;
        let spec = self
            .ctx
            .authorized(RequestSpec::get(self.ctx.url(PACKAGES_SLUG)), &token)
            .header(format!("Accept-Language: {}", query.locale))
            .form(query.query_pairs());

        let query_json =
            serde_json::to_string(query).map_err(|err| AiraloError::from(InfraError::from(err)))?;
        let key = ResponseCache::<PackageListing>::key(
            [spec.url(), query_json.as_str(), token.as_str()]
                .into_iter()
                .chain(self.ctx.config().http_headers.iter().map(String::as_str)),
        );

        self.cache.get_or_fetch(key, || self.fetch(spec, query)).await
    }

    async fn fetch(&self, spec: RequestSpec, query: &PackageQuery) -> Result<Option<PackageListing>> {
        let start = PageStart::from_requested(query.page);
        let Some(rows) = self.pagination.collect(&spec, start, query.limit).await?.into_items() else {
            debug!(?query, "catalog query returned no packages");
            return Ok(None);
        };

        if !query.flat {
            return Ok(Some(PackageListing::Nested(rows)));
        }

        let entries: Vec<CatalogEntry> = serde_json::from_value(Value::Array(rows))
            .map_err(|err| AiraloError::from(InfraError::from(err)))?;
        Ok(Some(PackageListing::Flat(FlatPackage::flatten(&entries))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use airalo_domain::PackageKind;
    use serde_json::json;

    use super::*;
    use crate::http::testing::{path_and_query, Reply, ScriptedTransport};
    use crate::services::support::context;

    fn catalog_entry(slug: &str, package_ids: &[&str]) -> Value {
        let packages: Vec<Value> =
            package_ids.iter().map(|id| json!({ "id": id, "type": "sim", "price": 5 })).collect();
        json!({
            "slug": slug,
            "operators": [{
                "title": format!("{slug} operator"),
                "countries": [{ "country_code": slug.to_uppercase() }],
                "packages": packages
            }]
        })
    }

    fn catalog() -> Arc<ScriptedTransport> {
        ScriptedTransport::new(|request| {
            let query = request.url().query().unwrap_or_default().to_string();
            if query.contains("page=1") {
                Reply::json(200, &json!({
                    "data": [catalog_entry("de", &["de-1", "de-2"])],
                    "meta": { "last_page": 2 }
                }))
            } else if query.contains("page=2") {
                Reply::json(200, &json!({
                    "data": [catalog_entry("fr", &["fr-1"])],
                    "meta": { "last_page": 2 }
                }))
            } else {
                Reply::json(200, &json!({ "data": [], "meta": {} }))
            }
        })
    }

    #[tokio::test]
    async fn sweeps_every_page() {
        let transport = catalog();
        let service = PackagesService::new(context(&transport));

        let listing = service.packages(&PackageQuery::all()).await.unwrap().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(transport.calls(), 2);

        let first = &transport.seen()[0];
        assert_eq!(path_and_query(&first.url), "/v2/packages?include=topup&page=1");
        assert_eq!(first.headers["authorization"], "Bearer test-token");
        assert_eq!(first.headers["accept-language"], "en");
    }

    #[tokio::test]
    async fn flat_listing_has_one_row_per_package() {
        let transport = catalog();
        let service = PackagesService::new(context(&transport));

        let listing = service.packages(&PackageQuery::all().flat(true)).await.unwrap().unwrap();
        let PackageListing::Flat(rows) = listing else { panic!("expected flat rows") };
        let ids: Vec<&str> = rows.iter().map(|row| row.package_id.as_str()).collect();
        assert_eq!(ids, vec!["de-1", "de-2", "fr-1"]);
        assert_eq!(rows[2].countries, vec!["FR".to_string()]);
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache() {
        let transport = catalog();
        let service = PackagesService::new(context(&transport));
        let query = PackageQuery::of_kind(PackageKind::Local).locale("de");

        service.packages(&query).await.unwrap();
        service.packages(&query).await.unwrap();
        assert_eq!(transport.calls(), 2);

        service.packages(&query.clone().locale("fr")).await.unwrap();
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn empty_catalog_is_none() {
        let transport = ScriptedTransport::new(|_| Reply::json(200, &json!({ "data": [] })));
        let service = PackagesService::new(context(&transport));
        assert!(service.packages(&PackageQuery::country("xx")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_api_is_none() {
        let transport = ScriptedTransport::new(|_| Reply::io("dns failure"));
        let service = PackagesService::new(context(&transport));
        assert!(service.packages(&PackageQuery::all()).await.unwrap().is_none());
    }
}
