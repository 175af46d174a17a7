use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MenuConfig;
use crate::menu::error::MenuError;
use crate::menu::extract::normalize_price_token;
use crate::menu::model::{format_minor_units, MenuItem, MenuSource, DEFAULT_CATEGORY};

use super::MenuSourceAdapter;

/// Wrapper keys unwrapped one level before shape recognition.
const WRAPPER_KEYS: [&str; 4] = ["menu", "items", "categories", "data"];

/// Probes a fixed list of candidate JSON endpoints and maps any recognized
/// payload shape to menu items. Cheapest stage, most likely to break entirely.
pub struct StructuredEndpointAdapter {
    client: Client,
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    /// Integer prices are minor units (cents).
    Minor(i64),
    Major(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(alias = "title")]
    name: String,
    #[serde(default, alias = "desc")]
    description: Option<String>,
    #[serde(default)]
    price: Option<RawPrice>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryBlock {
    #[serde(alias = "name", alias = "title")]
    category: String,
    items: Vec<RawItem>,
}

/// The three JSON shapes we recognize. Untagged: a categorized list requires
/// an `items` field per element, so a flat item list never matches it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EndpointPayload {
    CategorizedList(Vec<CategoryBlock>),
    FlatList(Vec<RawItem>),
    NestedMap(BTreeMap<String, Vec<RawItem>>),
}

impl StructuredEndpointAdapter {
    pub fn new(config: &MenuConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.endpoint_timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            urls: config.endpoint_urls.clone(),
        }
    }
}

#[async_trait]
impl MenuSourceAdapter for StructuredEndpointAdapter {
    fn source(&self) -> MenuSource {
        MenuSource::StructuredEndpoint
    }

    async fn acquire(&self) -> Result<Vec<MenuItem>, MenuError> {
        for url in &self.urls {
            debug!("Probing structured endpoint: {}", url);

            let response = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("Endpoint {} unreachable: {}", url, e);
                    continue;
                }
            };
            if !response.status().is_success() {
                warn!("Endpoint {} returned {}", url, response.status());
                continue;
            }

            let value: Value = match response.json().await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Endpoint {} returned non-JSON body: {}", url, e);
                    continue;
                }
            };

            let items = map_payload(value);
            if !items.is_empty() {
                debug!("Endpoint {} yielded {} items", url, items.len());
                return Ok(items);
            }
        }

        Err(MenuError::adapter(
            MenuSource::StructuredEndpoint,
            "no candidate endpoint yielded a recognizable menu payload",
        ))
    }
}

/// Map a JSON payload to menu items; unrecognized shapes map to no items.
pub fn map_payload(value: Value) -> Vec<MenuItem> {
    let value = unwrap_wrapper(value);

    let Ok(payload) = serde_json::from_value::<EndpointPayload>(value) else {
        return Vec::new();
    };

    match payload {
        EndpointPayload::CategorizedList(blocks) => blocks
            .into_iter()
            .flat_map(|block| {
                let category = block.category;
                block
                    .items
                    .into_iter()
                    .map(move |item| to_menu_item(item, Some(category.clone())))
            })
            .collect(),
        EndpointPayload::FlatList(items) => {
            items.into_iter().map(|i| to_menu_item(i, None)).collect()
        }
        EndpointPayload::NestedMap(map) => map
            .into_iter()
            .flat_map(|(category, items)| {
                items
                    .into_iter()
                    .map(move |item| to_menu_item(item, Some(category.clone())))
            })
            .collect(),
    }
}

fn unwrap_wrapper(value: Value) -> Value {
    if let Value::Object(ref obj) = value {
        for key in WRAPPER_KEYS {
            if let Some(inner) = obj.get(key) {
                return inner.clone();
            }
        }
    }
    value
}

fn to_menu_item(raw: RawItem, category: Option<String>) -> MenuItem {
    let price = match raw.price {
        Some(RawPrice::Minor(minor)) => format_minor_units(minor),
        Some(RawPrice::Major(major)) => format!("${:.2}", major),
        Some(RawPrice::Text(text)) => normalize_price_token(&text)
            .or_else(|| text.trim().parse::<f64>().ok().map(|v| format!("${:.2}", v)))
            .unwrap_or(text),
        None => String::new(),
    };

    let category = raw
        .category
        .or(category)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    MenuItem::new(raw.name, raw.description.unwrap_or_default(), price, category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_map_shape() {
        let payload = json!({
            "Coffee": [{"name": "Espresso", "price": 350}],
            "Tea": [{"name": "Green Tea", "price": 250}]
        });
        let items = map_payload(payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, "Coffee");
        assert_eq!(items[0].price, "$3.50");
    }

    #[test]
    fn test_flat_list_shape() {
        let payload = json!([
            {"name": "Latte", "price": "4.50", "category": "Coffee"},
            {"title": "Muffin", "desc": "blueberry"}
        ]);
        let items = map_payload(payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Latte");
        assert_eq!(items[1].name, "Muffin");
        assert_eq!(items[1].description, "blueberry");
        assert_eq!(items[1].price, "price not available");
        assert_eq!(items[1].category, "General");
    }

    #[test]
    fn test_categorized_list_shape() {
        let payload = json!([
            {"category": "Coffee", "items": [{"name": "Espresso", "price": 3.5}]}
        ]);
        let items = map_payload(payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, "Coffee");
        assert_eq!(items[0].price, "$3.50");
    }

    #[test]
    fn test_wrapper_key_unwrapped() {
        let payload = json!({"menu": [{"name": "Mocha", "price": 525}]});
        let items = map_payload(payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, "$5.25");
    }

    #[test]
    fn test_minor_units_divided_by_100() {
        let payload = json!([{"name": "Cold Brew", "price": 475}]);
        let items = map_payload(payload);
        assert_eq!(items[0].price, "$4.75");
    }

    #[test]
    fn test_unrecognized_shape_yields_nothing() {
        assert!(map_payload(json!("just a string")).is_empty());
        assert!(map_payload(json!({"hours": "7-5"})).is_empty());
    }
}
