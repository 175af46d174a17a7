use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel price used when no price could be extracted for an item.
pub const PRICE_NOT_AVAILABLE: &str = "price not available";

/// Default category bucket when no category can be resolved.
pub const DEFAULT_CATEGORY: &str = "General";

/// Which acquisition stage produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuSource {
    StructuredEndpoint,
    RenderedPage,
    StaticPage,
    None,
}

impl MenuSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuSource::StructuredEndpoint => "structured-endpoint",
            MenuSource::RenderedPage => "rendered-page",
            MenuSource::StaticPage => "static-page",
            MenuSource::None => "none",
        }
    }
}

/// A single normalized menu entry. Immutable once constructed; identity for
/// deduplication is the `(name, category)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
}

impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let price = price.into();
        let category = category.into();
        Self {
            name: name.into(),
            description: description.into(),
            price: if price.trim().is_empty() {
                PRICE_NOT_AVAILABLE.to_string()
            } else {
                price
            },
            category: if category.trim().is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category
            },
        }
    }

    /// Dedup key: same name in the same category is the same item.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.clone(), self.category.clone())
    }
}

/// The full normalized menu at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSnapshot {
    pub items: Vec<MenuItem>,
    /// Distinct categories across `items`, first-seen order.
    pub categories: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub source: MenuSource,
    /// Annotations added by the cache layer, never by adapters.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

impl MenuSnapshot {
    /// Build a snapshot from discovery-ordered items. Categories are derived
    /// here so they always match the items exactly.
    pub fn new(items: Vec<MenuItem>, source: MenuSource) -> Self {
        let categories = distinct_categories(&items);
        Self {
            items,
            categories,
            last_updated: Utc::now(),
            source,
            cached: false,
            cache_timestamp: None,
            stale: false,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Distinct category values in first-seen order.
pub fn distinct_categories(items: &[MenuItem]) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.iter().any(|c| c == &item.category) {
            seen.push(item.category.clone());
        }
    }
    seen
}

/// Drop later duplicates of `(name, category)`, keeping discovery order.
pub fn dedupe_items(items: Vec<MenuItem>) -> Vec<MenuItem> {
    let mut out: Vec<MenuItem> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|e| e.dedup_key() == item.dedup_key()) {
            out.push(item);
        }
    }
    out
}

/// Format a minor-unit integer price (e.g. cents) as a canonical `$D.DD` string.
pub fn format_minor_units(minor: i64) -> String {
    format!("${}.{:02}", minor / 100, (minor % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_match_items() {
        let items = vec![
            MenuItem::new("Espresso", "", "$3.50", "COFFEE"),
            MenuItem::new("Latte", "", "$4.50", "COFFEE"),
            MenuItem::new("Green Tea", "", "$2.50", "TEA"),
        ];
        let snapshot = MenuSnapshot::new(items, MenuSource::StaticPage);
        assert_eq!(snapshot.categories, vec!["COFFEE", "TEA"]);
        assert_eq!(snapshot.item_count(), 3);
    }

    #[test]
    fn test_defaults_applied() {
        let item = MenuItem::new("Scone", "", "", "");
        assert_eq!(item.price, PRICE_NOT_AVAILABLE);
        assert_eq!(item.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_dedupe_by_name_and_category() {
        let items = vec![
            MenuItem::new("Latte", "", "$4.50", "COFFEE"),
            MenuItem::new("Latte", "with oat milk", "$5.00", "COFFEE"),
            MenuItem::new("Latte", "", "$4.50", "SPECIALS"),
        ];
        let deduped = dedupe_items(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].price, "$4.50");
        assert_eq!(deduped[1].category, "SPECIALS");
    }

    #[test]
    fn test_format_minor_units() {
        assert_eq!(format_minor_units(350), "$3.50");
        assert_eq!(format_minor_units(1200), "$12.00");
        assert_eq!(format_minor_units(5), "$0.05");
    }
}
