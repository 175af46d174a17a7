use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::model::{MenuItem, DEFAULT_CATEGORY};

/// Currency token, e.g. `$3.50` or `$12`.
pub static PRICE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)(?:\.(\d{1,2}))?").expect("valid price regex"));

/// Short ALL-CAPS line treated as a category heading in plain text.
static CATEGORY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z\s&]+$").expect("valid category regex"));

/// Selector cascades for heuristic HTML extraction. Each list is tried in
/// priority order; the first selector (or first non-empty text) wins.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub container_selectors: Vec<String>,
    pub name_selectors: Vec<String>,
    pub description_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub section_heading_selectors: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            container_selectors: vec![
                ".menu-item".into(),
                ".menu_item".into(),
                "[class*='menu-item']".into(),
                ".product-card".into(),
                ".item".into(),
                "[class*='product']".into(),
            ],
            name_selectors: vec![
                ".name".into(),
                ".item-name".into(),
                ".title".into(),
                "h3".into(),
                "h4".into(),
                "strong".into(),
            ],
            description_selectors: vec![
                ".description".into(),
                ".desc".into(),
                ".item-description".into(),
                "p".into(),
            ],
            price_selectors: vec![
                ".price".into(),
                ".item-price".into(),
                "[class*='price']".into(),
                "span".into(),
            ],
            section_heading_selectors: vec![
                ".category-name".into(),
                ".section-title".into(),
                ".category-title".into(),
                "h2".into(),
                "h3".into(),
            ],
        }
    }
}

/// Extract menu items from raw HTML.
///
/// Container selectors are tried in order; the first one matching at least one
/// element is used exclusively (sibling selectors are never merged). If none
/// match, falls back to the plain-text heuristic over the document text.
pub fn extract_from_html(html: &str, rules: &ExtractionRules) -> Vec<MenuItem> {
    let document = Html::parse_document(html);

    for raw in &rules.container_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let containers: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if containers.is_empty() {
            continue;
        }
        debug!(
            "container selector '{}' matched {} elements",
            raw,
            containers.len()
        );

        let mut items = Vec::new();
        for container in containers {
            if let Some(item) = extract_item(container, rules) {
                items.push(item);
            }
        }
        return items;
    }

    debug!("no container selector matched, falling back to text heuristic");
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");
    extract_from_text(&text)
}

fn extract_item(container: ElementRef<'_>, rules: &ExtractionRules) -> Option<MenuItem> {
    let name = first_text(container, &rules.name_selectors)?;
    if name.trim().is_empty() {
        return None;
    }

    let description = first_text(container, &rules.description_selectors).unwrap_or_default();

    let price = first_text(container, &rules.price_selectors)
        .and_then(|t| normalize_price_token(&t))
        .unwrap_or_default();

    let category = resolve_category(container, rules).unwrap_or_else(|| DEFAULT_CATEGORY.into());

    Some(MenuItem::new(name.trim(), description.trim(), price, category))
}

/// First non-empty text among the field selectors, in order. First match
/// wins; later selectors are not consulted once text is found.
fn first_text(scope: ElementRef<'_>, selectors: &[String]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for el in scope.select(&selector) {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Walk up to the nearest ancestor that looks like a menu section and pull a
/// heading out of it.
fn resolve_category(container: ElementRef<'_>, rules: &ExtractionRules) -> Option<String> {
    for node in container.ancestors() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if !is_section_element(&el) {
            continue;
        }
        for raw in &rules.section_heading_selectors {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            if let Some(heading) = el.select(&selector).next() {
                let text = collapse_whitespace(&heading.text().collect::<String>());
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn is_section_element(el: &ElementRef<'_>) -> bool {
    if el.value().name() == "section" {
        return true;
    }
    el.value()
        .attr("class")
        .map(|c| {
            let c = c.to_lowercase();
            c.contains("section") || c.contains("category") || c.contains("menu-group")
        })
        .unwrap_or(false)
}

/// Line-based heuristic for plain (or server-rendered) text.
///
/// A short ALL-CAPS line becomes the current category for the lines after it;
/// a line containing a `$`-numeric token splits on the first `$` into
/// name + price. Names shorter than 3 characters are discarded.
pub fn extract_from_text(text: &str) -> Vec<MenuItem> {
    let mut items = Vec::new();
    let mut current_category = DEFAULT_CATEGORY.to_string();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.len() < 50 && CATEGORY_LINE.is_match(line) {
            current_category = line.to_string();
            continue;
        }

        let Some(dollar) = line.find('$') else {
            continue;
        };
        if !PRICE_TOKEN.is_match(&line[dollar..]) {
            continue;
        }

        let name = line[..dollar]
            .trim()
            .trim_end_matches(['-', '–', '·', '.', ':'])
            .trim();
        if name.len() < 3 {
            continue;
        }

        let raw_price = line[dollar..].trim();
        let price = normalize_price_token(raw_price).unwrap_or_else(|| raw_price.to_string());

        items.push(MenuItem::new(name, "", price, current_category.clone()));
    }

    items
}

/// Pull the first currency token out of `text` and format it canonically as
/// `$D.DD`. Returns None when no token is present.
pub fn normalize_price_token(text: &str) -> Option<String> {
    let caps = PRICE_TOKEN.captures(text)?;
    let whole: i64 = caps.get(1)?.as_str().parse().ok()?;
    let cents = match caps.get(2) {
        Some(m) if m.as_str().len() == 1 => m.as_str().parse::<i64>().ok()? * 10,
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some(format!("${}.{:02}", whole, cents))
}

/// All currency tokens in `text`, canonicalized, in order of appearance.
pub fn all_price_tokens(text: &str) -> Vec<String> {
    PRICE_TOKEN
        .find_iter(text)
        .filter_map(|m| normalize_price_token(m.as_str()))
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fixture_single_item() {
        let html = r#"<div class="menu-item"><h3 class="name">Espresso</h3><span class="price">$3.50</span></div>"#;
        let items = extract_from_html(html, &ExtractionRules::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Espresso");
        assert_eq!(items[0].price, "$3.50");
        assert_eq!(items[0].category, "General");
        assert_eq!(items[0].description, "");
    }

    #[test]
    fn test_first_container_selector_wins() {
        // .menu-item matches, so the later .item selector is never consulted.
        let html = r#"
            <div class="menu-item"><h3 class="name">Espresso</h3><span class="price">$3.50</span></div>
            <div class="item"><h3 class="name">Ghost Entry</h3><span class="price">$9.99</span></div>
        "#;
        let items = extract_from_html(html, &ExtractionRules::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Espresso");
    }

    #[test]
    fn test_category_from_section_ancestor() {
        let html = r#"
            <section class="menu-section">
                <h2>Pastries</h2>
                <div class="menu-item"><h3 class="name">Croissant</h3><span class="price">$4.00</span></div>
            </section>
        "#;
        let items = extract_from_html(html, &ExtractionRules::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, "Pastries");
    }

    #[test]
    fn test_text_heuristic_categories() {
        let items = extract_from_text("COFFEE\nEspresso $3.50\nTEA\nGreen Tea $2.50");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Espresso");
        assert_eq!(items[0].category, "COFFEE");
        assert_eq!(items[0].price, "$3.50");
        assert_eq!(items[1].name, "Green Tea");
        assert_eq!(items[1].category, "TEA");
    }

    #[test]
    fn test_text_heuristic_discards_short_names() {
        let items = extract_from_text("AB $1.00\nFlat White $4.50");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Flat White");
    }

    #[test]
    fn test_text_heuristic_defaults_to_general() {
        let items = extract_from_text("Espresso $3.50");
        assert_eq!(items[0].category, "General");
    }

    #[test]
    fn test_html_falls_back_to_text_heuristic() {
        let html = "<html><body><pre>COFFEE\nEspresso $3.50</pre></body></html>";
        let items = extract_from_html(html, &ExtractionRules::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Espresso");
        assert_eq!(items[0].category, "COFFEE");
    }

    #[test]
    fn test_normalize_price_token() {
        assert_eq!(normalize_price_token("$3.50").as_deref(), Some("$3.50"));
        assert_eq!(normalize_price_token("$12").as_deref(), Some("$12.00"));
        assert_eq!(normalize_price_token("$4.5").as_deref(), Some("$4.50"));
        assert_eq!(normalize_price_token("from $8.25 daily").as_deref(), Some("$8.25"));
        assert_eq!(normalize_price_token("no price here"), None);
    }
}
