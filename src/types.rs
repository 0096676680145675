// Portfolio Domain Types
// Entries, the two-collection portfolio, and the metadata scraped for an entry.
// Anything parsed from untrusted JSON goes through `Portfolio::from_value`,
// which enforces the shape check before decoding items.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{LinkfolioError, Result};

/// Placeholder banner used whenever a page exposes no usable image
pub const DEFAULT_BANNER_URL: &str =
    "https://images.unsplash.com/photo-1522199670076-2852f80289c3?auto=format&fit=crop&w=1200&q=80";

/// A single curated link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
}

/// Which of the two portfolio sequences an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Shops,
    Services,
}

impl Collection {
    /// Singular, capitalised label used in status messages
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Shops => "Shop",
            Collection::Services => "Service",
        }
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            Collection::Shops => "SHOP",
            Collection::Services => "SERVICE",
        }
    }

    /// Blurb for new entries whose page has no description
    pub fn default_description(&self) -> &'static str {
        match self {
            Collection::Shops => "New shop representing the latest collection.",
            Collection::Services => "New service crafted to move the business forward.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Shops => "shops",
            Collection::Services => "services",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = LinkfolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shops" | "shop" => Ok(Collection::Shops),
            "services" | "service" => Ok(Collection::Services),
            other => Err(LinkfolioError::invalid_input(
                "collection",
                format!("unknown collection '{other}'"),
            )),
        }
    }
}

/// The full set of curated shops and services
///
/// `Default` yields the seeded set shown before anything has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub shops: Vec<PortfolioItem>,
    pub services: Vec<PortfolioItem>,
}

impl Portfolio {
    /// Validate the shape of an untrusted JSON value and decode it
    ///
    /// # Invariants
    /// - Value is an object
    /// - `shops` and `services` are both present and both arrays
    /// - Every element decodes as a `PortfolioItem`
    pub fn from_value(value: Value) -> Result<Self> {
        if !has_portfolio_shape(&value) {
            return Err(LinkfolioError::invalid_input(
                "portfolio",
                "expected an object with 'shops' and 'services' arrays",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| LinkfolioError::invalid_input("portfolio", e.to_string()))
    }

    /// Parse a JSON document, applying the same shape check as `from_value`
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| LinkfolioError::invalid_input("portfolio", e.to_string()))?;
        Self::from_value(value)
    }

    pub fn items(&self, collection: Collection) -> &[PortfolioItem] {
        match collection {
            Collection::Shops => &self.shops,
            Collection::Services => &self.services,
        }
    }

    pub fn items_mut(&mut self, collection: Collection) -> &mut Vec<PortfolioItem> {
        match collection {
            Collection::Shops => &mut self.shops,
            Collection::Services => &mut self.services,
        }
    }

    /// Fill in missing icon and banner fields with per-collection defaults
    pub fn normalized(mut self) -> Self {
        for collection in [Collection::Shops, Collection::Services] {
            for item in self.items_mut(collection) {
                if item.icon.is_none() {
                    item.icon = Some(collection.default_icon().to_string());
                }
                if item.banner_url.is_none() {
                    item.banner_url = Some(DEFAULT_BANNER_URL.to_string());
                }
            }
        }
        self
    }

    /// True when no id repeats inside either collection
    pub fn has_unique_ids(&self) -> bool {
        [&self.shops, &self.services].iter().all(|items| {
            let mut ids: Vec<i64> = items.iter().map(|item| item.id).collect();
            ids.sort_unstable();
            ids.windows(2).all(|pair| pair[0] != pair[1])
        })
    }
}

fn has_portfolio_shape(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => {
            matches!(map.get("shops"), Some(Value::Array(_)))
                && matches!(map.get("services"), Some(Value::Array(_)))
        }
        None => false,
    }
}

fn seed_item(id: i64, icon: &str, name: &str, description: &str, url: &str, banner: &str) -> PortfolioItem {
    PortfolioItem {
        id,
        name: name.to_string(),
        description: description.to_string(),
        icon: Some(icon.to_string()),
        url: url.to_string(),
        banner_url: Some(banner.to_string()),
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            shops: vec![
                seed_item(
                    1,
                    "SHOP",
                    "Premium Footwear",
                    "Curated collection of high-quality shoes from around the world. From casual comfort to luxury fashion, find your perfect pair.",
                    "https://www.nike.com/",
                    "https://images.unsplash.com/photo-1524504388940-b1c1722653e1?auto=format&fit=crop&w=1100&q=80",
                ),
                seed_item(
                    2,
                    "TOOLS",
                    "Pro Tools & Equipment",
                    "Professional-grade imported tools and equipment for contractors, craftsmen, and DIY enthusiasts. Quality you can trust.",
                    "https://www.harborfreight.com/",
                    "https://images.unsplash.com/photo-1489515217757-5fd1be406fef?auto=format&fit=crop&w=1100&q=80",
                ),
            ],
            services: vec![
                seed_item(
                    1,
                    "GROW",
                    "Trading Solutions",
                    "Expert financial market trading services with advanced analytics and personalized investment strategies.",
                    "https://www.investopedia.com/",
                    "https://images.unsplash.com/photo-1469474968028-56623f02e42e?auto=format&fit=crop&w=1100&q=80",
                ),
                seed_item(
                    2,
                    "WEB",
                    "Web Development",
                    "Custom business websites and digital solutions that drive growth and enhance your online presence.",
                    "https://www.smashingmagazine.com/",
                    "https://images.unsplash.com/photo-1487017159836-4e23ece2e4cf?auto=format&fit=crop&w=1100&q=80",
                ),
                seed_item(
                    3,
                    "HOME",
                    "Real Estate",
                    "Comprehensive real estate services for buying, selling, and renting properties with expert market guidance.",
                    "https://www.architecturaldigest.com/",
                    "https://images.unsplash.com/photo-1450641068570-4f7b5d3c1d33?auto=format&fit=crop&w=1100&q=80",
                ),
            ],
        }
    }
}

/// Metadata scraped from a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedMetadata {
    /// Always populated; falls back to `DEFAULT_BANNER_URL`
    pub banner: String,
    pub title: String,
    pub description: String,
}

impl Default for ScrapedMetadata {
    fn default() -> Self {
        Self {
            banner: DEFAULT_BANNER_URL.to_string(),
            title: String::new(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_portfolio_is_seeded() {
        let portfolio = Portfolio::default();
        assert_eq!(portfolio.shops.len(), 2);
        assert_eq!(portfolio.services.len(), 3);
        assert!(portfolio.has_unique_ids());
    }

    #[test]
    fn test_item_serializes_camel_case_and_skips_absent_fields() {
        let item = PortfolioItem {
            id: 7,
            name: "Acme".into(),
            description: String::new(),
            icon: None,
            url: "https://acme.test".into(),
            banner_url: Some("https://acme.test/b.png".into()),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["bannerUrl"], "https://acme.test/b.png");
        assert!(value.get("icon").is_none());
        assert!(value.get("banner_url").is_none());
    }

    #[test]
    fn test_shape_check_rejects_bad_payloads() {
        let rejected = [
            json!(null),
            json!([]),
            json!("shops"),
            json!({"shops": []}),
            json!({"services": []}),
            json!({"shops": {}, "services": []}),
            json!({"shops": [], "services": null}),
        ];
        for value in rejected {
            assert!(
                Portfolio::from_value(value.clone()).is_err(),
                "expected rejection for {value}"
            );
        }
    }

    #[test]
    fn test_shape_check_accepts_minimal_items() {
        let portfolio = Portfolio::from_value(json!({
            "shops": [{"id": 1, "name": "A"}],
            "services": [],
            "extra": true
        }))
        .unwrap();
        assert_eq!(portfolio.shops[0].description, "");
        assert_eq!(portfolio.shops[0].url, "");
        assert!(portfolio.services.is_empty());
    }

    #[test]
    fn test_from_json_rejects_malformed_text() {
        let err = Portfolio::from_json("{not json").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_normalized_fills_icons_and_banners() {
        let portfolio = Portfolio {
            shops: vec![PortfolioItem {
                id: 1,
                name: "A".into(),
                description: String::new(),
                icon: None,
                url: String::new(),
                banner_url: None,
            }],
            services: vec![PortfolioItem {
                id: 1,
                name: "B".into(),
                description: String::new(),
                icon: Some("WEB".into()),
                url: String::new(),
                banner_url: None,
            }],
        }
        .normalized();

        assert_eq!(portfolio.shops[0].icon.as_deref(), Some("SHOP"));
        assert_eq!(portfolio.services[0].icon.as_deref(), Some("WEB"));
        assert_eq!(
            portfolio.services[0].banner_url.as_deref(),
            Some(DEFAULT_BANNER_URL)
        );
    }

    #[test]
    fn test_collection_parsing() {
        assert_eq!("shops".parse::<Collection>().unwrap(), Collection::Shops);
        assert_eq!("Service".parse::<Collection>().unwrap(), Collection::Services);
        assert!("widgets".parse::<Collection>().is_err());
    }

    #[test]
    fn test_duplicate_ids_detected_per_collection() {
        let mut portfolio = Portfolio::default();
        assert!(portfolio.has_unique_ids());
        let dup = portfolio.shops[0].clone();
        portfolio.shops.push(dup);
        assert!(!portfolio.has_unique_ids());
    }
}
