use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::config::BrowserConfig;
use crate::menu::error::MenuError;
use crate::menu::extract::{all_price_tokens, collapse_whitespace, PRICE_TOKEN};
use crate::menu::model::{dedupe_items, MenuItem, MenuSource, DEFAULT_CATEGORY};

use super::MenuSourceAdapter;

/// Subresources blocked before navigation. The menu text does not need
/// images, styles, fonts, or analytics beacons, and skipping them cuts page
/// load time substantially.
const BLOCKED_URL_PATTERNS: [&str; 12] = [
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.webp", "*.css", "*.woff",
    "*.woff2", "*google-analytics*", "*googletagmanager*", "*doubleclick*",
];

/// Fixed substrings that mark a text block as site chrome rather than a menu
/// entry (navigation labels, store locator text, editor affordances).
const UI_NOISE_MARKERS: [&str; 8] = [
    "Edit",
    "Search",
    "Sign in",
    "Sign up",
    "Order online",
    "Directions",
    "Opening hours",
    "Find a location",
];

/// Polling interval for bounded condition waits.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Safety margin after a category's content-readiness wait resolves.
const POST_CLICK_SETTLE: Duration = Duration::from_millis(200);

/// Minimum distinct price-bearing elements before a category is considered
/// rendered.
const CONTENT_READY_THRESHOLD: i64 = 3;

const COUNT_PRICE_BLOCKS_JS: &str = r#"
(() => {
    const re = /\$\d/;
    const seen = new Set();
    document.querySelectorAll('div,li,span,p').forEach(e => {
        const t = (e.innerText || '').trim();
        if (re.test(t)) seen.add(t);
    });
    return seen.size;
})()
"#;

/// Innermost containers whose visible text carries a currency token.
const COLLECT_BLOCKS_JS: &str = r#"
(() => {
    const re = /\$\d/;
    const out = [];
    document.querySelectorAll('div,li,article').forEach(e => {
        const t = (e.innerText || '').trim();
        if (t && re.test(t) && t.length < 400 && e.querySelector('div,li,article') === null) {
            out.push(t);
        }
    });
    return out;
})()
"#;

/// Drives a headless browser through the menu page: navigate, wait for the
/// menu to render, click through category tabs, and read the resulting DOM
/// text. Expensive stage, but the only one that sees JS-rendered content.
pub struct RenderedPageAdapter {
    page_url: String,
    config: BrowserConfig,
}

impl RenderedPageAdapter {
    pub fn new(page_url: String, config: BrowserConfig) -> Self {
        Self { page_url, config }
    }

    async fn scrape(&self, browser: &Browser) -> Result<Vec<MenuItem>, MenuError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(cdp_err)?;

        block_subresources(&page).await;

        let nav_timeout = Duration::from_secs(self.config.navigation_timeout_seconds);
        timeout(nav_timeout, async {
            page.goto(self.page_url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| {
            MenuError::adapter(MenuSource::RenderedPage, "navigation timed out")
        })?
        .map_err(cdp_err)?;

        // DOM is ready; give client-side rendering a fixed head start, then
        // wait (bounded) for a menu marker before proceeding regardless.
        sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        self.wait_for_marker(&page).await;

        let labels = self.category_labels(&page).await;

        let mut items = Vec::new();
        if labels.is_empty() {
            debug!("No category tabs found, scanning page as a single pass");
            let blocks = collect_blocks(&page).await?;
            items.extend(parse_blocks(&blocks, DEFAULT_CATEGORY));
        } else {
            debug!("Discovered {} category tabs", labels.len());
            for label in &labels {
                if let Err(e) = self.open_category(&page, label).await {
                    warn!("Could not open category '{}': {}", label, e);
                    continue;
                }
                let blocks = collect_blocks(&page).await?;
                items.extend(parse_blocks(&blocks, label));
            }
        }

        Ok(dedupe_items(items))
    }

    /// Bounded wait for the menu marker element; proceeds either way.
    async fn wait_for_marker(&self, page: &Page) {
        let deadline = Instant::now() + Duration::from_millis(self.config.marker_wait_ms);
        loop {
            if page.find_element(self.config.marker_selector.as_str()).await.is_ok() {
                return;
            }
            if Instant::now() >= deadline {
                debug!("Menu marker never appeared, proceeding anyway");
                return;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn category_labels(&self, page: &Page) -> Vec<String> {
        let tabs = match page.find_elements(self.config.tab_selector.as_str()).await {
            Ok(tabs) => tabs,
            Err(_) => return Vec::new(),
        };

        let mut labels = Vec::new();
        for tab in tabs {
            if let Ok(Some(text)) = tab.inner_text().await {
                let label = collapse_whitespace(&text);
                if !label.is_empty() && !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        labels
    }

    /// Click the tab matching `label` and wait (bounded) until the category's
    /// content has rendered: at least 3 distinct price-bearing elements, or
    /// the per-category timeout, whichever comes first.
    async fn open_category(&self, page: &Page, label: &str) -> Result<(), MenuError> {
        // Tabs are re-queried per click; earlier handles go stale when the
        // page re-renders.
        let tabs = page
            .find_elements(self.config.tab_selector.as_str())
            .await
            .map_err(cdp_err)?;

        let mut clicked = false;
        for tab in tabs {
            let text = tab.inner_text().await.ok().flatten().unwrap_or_default();
            if collapse_whitespace(&text) == label {
                tab.click().await.map_err(cdp_err)?;
                clicked = true;
                break;
            }
        }
        if !clicked {
            return Err(MenuError::adapter(
                MenuSource::RenderedPage,
                format!("tab '{}' disappeared before it could be clicked", label),
            ));
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.category_wait_ms);
        loop {
            let count = price_block_count(page).await.unwrap_or(0);
            if count >= CONTENT_READY_THRESHOLD {
                break;
            }
            if Instant::now() >= deadline {
                debug!("Category '{}' content wait timed out (saw {})", label, count);
                break;
            }
            sleep(POLL_INTERVAL).await;
        }
        sleep(POST_CLICK_SETTLE).await;
        Ok(())
    }
}

#[async_trait]
impl MenuSourceAdapter for RenderedPageAdapter {
    fn source(&self) -> MenuSource {
        MenuSource::RenderedPage
    }

    async fn acquire(&self) -> Result<Vec<MenuItem>, MenuError> {
        let chrome_config = ChromeConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| MenuError::adapter(MenuSource::RenderedPage, e))?;

        let (mut browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(cdp_err)?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.scrape(&browser).await;

        // The session must be torn down on every exit path, success or not.
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

async fn block_subresources(page: &Page) {
    if let Err(e) = page.execute(EnableParams::default()).await {
        warn!("Could not enable network domain: {}", e);
        return;
    }
    let urls: Vec<String> = BLOCKED_URL_PATTERNS.iter().map(|s| s.to_string()).collect();
    if let Err(e) = page.execute(SetBlockedUrLsParams { urls }).await {
        warn!("Could not block subresource loads: {}", e);
    }
}

async fn price_block_count(page: &Page) -> Result<i64, MenuError> {
    page.evaluate(COUNT_PRICE_BLOCKS_JS)
        .await
        .map_err(cdp_err)?
        .into_value::<i64>()
        .map_err(cdp_err)
}

async fn collect_blocks(page: &Page) -> Result<Vec<String>, MenuError> {
    page.evaluate(COLLECT_BLOCKS_JS)
        .await
        .map_err(cdp_err)?
        .into_value::<Vec<String>>()
        .map_err(cdp_err)
}

fn cdp_err(e: impl std::fmt::Display) -> MenuError {
    MenuError::adapter(MenuSource::RenderedPage, e.to_string())
}

/// Parse the text blocks gathered for one category pass. Duplicate
/// `(name, category)` entries across passes are removed by the caller.
pub fn parse_blocks(blocks: &[String], category: &str) -> Vec<MenuItem> {
    blocks
        .iter()
        .filter_map(|block| parse_block(block, category))
        .collect()
}

/// Turn one DOM text block into a menu item.
///
/// The first non-price line is the name, remaining lines become the
/// description (truncated to 200 chars), and the price is the matched
/// currency token (an en-dash range when the block carries several).
fn parse_block(text: &str, category: &str) -> Option<MenuItem> {
    if is_ui_noise(text) {
        return None;
    }

    let prices = all_price_tokens(text);
    if prices.is_empty() {
        return None;
    }

    let mut name: Option<String> = None;
    let mut description_lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let stripped = collapse_whitespace(&PRICE_TOKEN.replace_all(line, ""));
        let stripped = stripped.trim_matches(['-', '–', '·', ':', '.']).trim();
        if stripped.is_empty() {
            continue;
        }
        match name {
            None => name = Some(stripped.to_string()),
            Some(_) => description_lines.push(stripped.to_string()),
        }
    }

    let name = name?;
    if name.len() < 3 || name.len() > 80 {
        return None;
    }
    if name.split_whitespace().count() > 12 {
        return None;
    }

    let price = join_price_range(&prices);
    let description: String = description_lines.join(" ").chars().take(200).collect();

    Some(MenuItem::new(name, description, price, category))
}

/// Blocks matching site-chrome signatures are never menu entries.
fn is_ui_noise(text: &str) -> bool {
    if UI_NOISE_MARKERS.iter().any(|m| text.contains(m)) {
        return true;
    }
    // Runs of three or more spaces usually mean concatenated UI strings.
    text.contains("   ")
}

/// Single price as-is; multiple distinct prices become a `low–high` range.
fn join_price_range(prices: &[String]) -> String {
    let mut distinct: Vec<&String> = Vec::new();
    for p in prices {
        if !distinct.contains(&p) {
            distinct.push(p);
        }
    }
    if distinct.len() == 1 {
        return distinct[0].clone();
    }

    let numeric = |p: &str| p.trim_start_matches('$').parse::<f64>().unwrap_or(0.0);
    let low = distinct
        .iter()
        .min_by(|a, b| numeric(a).total_cmp(&numeric(b)))
        .map(|p| p.as_str())
        .unwrap_or_default();
    let high = distinct
        .iter()
        .max_by(|a, b| numeric(a).total_cmp(&numeric(b)))
        .map(|p| p.as_str())
        .unwrap_or_default();
    format!("{}–{}", low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_name_description_price() {
        let block = "Latte\nSilky espresso with steamed milk\n$4.50";
        let item = parse_block(block, "COFFEE").unwrap();
        assert_eq!(item.name, "Latte");
        assert_eq!(item.description, "Silky espresso with steamed milk");
        assert_eq!(item.price, "$4.50");
        assert_eq!(item.category, "COFFEE");
    }

    #[test]
    fn test_parse_block_price_range() {
        let block = "Cold Brew\nSmall $3.50 / Large $5.00";
        let item = parse_block(block, "COFFEE").unwrap();
        assert_eq!(item.price, "$3.50–$5.00");
        assert_eq!(item.description, "Small / Large");
    }

    #[test]
    fn test_ui_noise_rejected() {
        assert!(parse_block("Search $0", "COFFEE").is_none());
        assert!(parse_block("Edit menu $1.00", "COFFEE").is_none());
        assert!(parse_block("Downtown   Pickup   $4.00", "COFFEE").is_none());
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(parse_block("ab $2.00", "COFFEE").is_none());
        let long_name = "a".repeat(90);
        assert!(parse_block(&format!("{} $2.00", long_name), "COFFEE").is_none());
    }

    #[test]
    fn test_blocks_without_price_skipped() {
        assert!(parse_block("Just a paragraph about our beans", "COFFEE").is_none());
    }

    #[test]
    fn test_description_truncated_to_200() {
        let block = format!("Pour Over\n{}\n$6.00", "x".repeat(400));
        let item = parse_block(&block, "COFFEE").unwrap();
        assert_eq!(item.description.chars().count(), 200);
    }

    #[test]
    fn test_two_category_passes_dedupe() {
        // The same item discovered under two passes of the same category must
        // collapse to a single entry.
        let pass_one = vec!["Latte\n$4.50".to_string()];
        let pass_two = vec!["Latte\n$4.50".to_string(), "Mocha\n$5.25".to_string()];

        let mut items = parse_blocks(&pass_one, "COFFEE");
        items.extend(parse_blocks(&pass_two, "COFFEE"));
        let items = dedupe_items(items);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Latte");
        assert_eq!(items[1].name, "Mocha");
    }
}
