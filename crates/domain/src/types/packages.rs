//! Package catalog query and row types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_str_enum_conversions;

/// Catalog filter applied to `GET packages`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Every package, top-ups included.
    #[default]
    All,
    /// SIM packages only (no top-ups).
    Sim,
    Local,
    Global,
}

impl_str_enum_conversions!(PackageKind {
    All => "all",
    Sim => "sim",
    Local => "local",
    Global => "global",
});

/// Parameters of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageQuery {
    pub kind: PackageKind,
    pub country: Option<String>,
    /// Page size sent to the API and accumulation cap for the sweep.
    pub limit: Option<usize>,
    /// First page to fetch. `None` starts at page 1; `Some(0)` sends no page
    /// parameter on the first call.
    pub page: Option<u32>,
    pub flat: bool,
    pub locale: String,
}

impl Default for PackageQuery {
    fn default() -> Self {
        Self {
            kind: PackageKind::All,
            country: None,
            limit: None,
            page: None,
            flat: false,
            locale: "en".to_string(),
        }
    }
}

impl PackageQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_kind(kind: PackageKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn country(code: impl Into<String>) -> Self {
        Self { country: Some(code.into().to_uppercase()), ..Self::default() }
    }

    pub fn flat(mut self, flat: bool) -> Self {
        self.flat = flat;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|limit| *limit > 0);
        self
    }

    pub fn page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Query pairs for the catalog URL, excluding pagination.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if self.kind != PackageKind::Sim {
            pairs.push(("include".to_string(), "topup".to_string()));
        }

        if matches!(self.kind, PackageKind::Local | PackageKind::Global) {
            pairs.push(("filter[type]".to_string(), self.kind.to_string()));
        }

        if let Some(country) = &self.country {
            pairs.push(("filter[country]".to_string(), country.clone()));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// One country/region entry of the nested catalog response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub operators: Vec<CatalogOperator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOperator {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub activation_policy: Option<String>,
    #[serde(default)]
    pub is_roaming: Option<bool>,
    #[serde(default)]
    pub info: Value,
    #[serde(default)]
    pub other_info: Option<String>,
    #[serde(default)]
    pub image: Option<CatalogImage>,
    #[serde(default)]
    pub countries: Vec<CatalogCountry>,
    #[serde(default)]
    pub packages: Vec<CatalogPackage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogCountry {
    #[serde(default)]
    pub country_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPackage {
    pub id: String,
    #[serde(default, rename = "type")]
    pub package_type: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub net_price: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub day: Value,
    #[serde(default)]
    pub is_unlimited: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub short_info: Option<String>,
    #[serde(default)]
    pub voice: Value,
    #[serde(default)]
    pub text: Value,
}

/// Operator summary carried by a flat row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatOperator {
    pub title: String,
    pub is_roaming: Option<bool>,
    pub info: Value,
}

/// One purchasable package with its operator and coverage inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPackage {
    pub package_id: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub package_type: String,
    pub price: Value,
    pub net_price: Value,
    pub amount: Value,
    pub day: Value,
    pub is_unlimited: bool,
    pub title: String,
    pub data: Value,
    pub short_info: Option<String>,
    pub voice: Value,
    pub text: Value,
    pub plan_type: Option<String>,
    pub activation_policy: Option<String>,
    pub operator: FlatOperator,
    pub countries: Vec<String>,
    pub image: Option<String>,
    pub other_info: Option<String>,
}

impl FlatPackage {
    /// Flatten nested catalog entries into one row per package.
    pub fn flatten(entries: &[CatalogEntry]) -> Vec<Self> {
        entries
            .iter()
            .flat_map(|entry| {
                entry.operators.iter().flat_map(move |operator| {
                    let countries: Vec<String> =
                        operator.countries.iter().map(|c| c.country_code.clone()).collect();

                    operator.packages.iter().map(move |package| Self {
                        package_id: package.id.clone(),
                        slug: entry.slug.clone(),
                        package_type: package.package_type.clone(),
                        price: package.price.clone(),
                        net_price: package.net_price.clone(),
                        amount: package.amount.clone(),
                        day: package.day.clone(),
                        is_unlimited: package.is_unlimited,
                        title: package.title.clone(),
                        data: package.data.clone(),
                        short_info: package.short_info.clone(),
                        voice: package.voice.clone(),
                        text: package.text.clone(),
                        plan_type: operator.plan_type.clone(),
                        activation_policy: operator.activation_policy.clone(),
                        operator: FlatOperator {
                            title: operator.title.clone(),
                            is_roaming: operator.is_roaming,
                            info: operator.info.clone(),
                        },
                        countries: countries.clone(),
                        image: operator.image.as_ref().and_then(|image| image.url.clone()),
                        other_info: operator.other_info.clone(),
                    })
                })
            })
            .collect()
    }
}
