use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::MenuConfig;
use crate::menu::error::MenuError;
use crate::menu::extract::{extract_from_html, ExtractionRules};
use crate::menu::model::{MenuItem, MenuSource};

use super::MenuSourceAdapter;

/// Fetches the raw menu page and runs the selector/text heuristics over it.
/// Last-resort stage: cheap, but only works when server-rendered markup exists.
pub struct StaticPageAdapter {
    client: Client,
    page_url: String,
    rules: ExtractionRules,
}

impl StaticPageAdapter {
    pub fn new(config: &MenuConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            page_url: config.page_url.clone(),
            rules: ExtractionRules::default(),
        }
    }
}

#[async_trait]
impl MenuSourceAdapter for StaticPageAdapter {
    fn source(&self) -> MenuSource {
        MenuSource::StaticPage
    }

    async fn acquire(&self) -> Result<Vec<MenuItem>, MenuError> {
        debug!("Fetching static page: {}", self.page_url);

        let response = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .map_err(|e| MenuError::adapter(MenuSource::StaticPage, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MenuError::adapter(
                MenuSource::StaticPage,
                format!("page returned {}", response.status()),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| MenuError::adapter(MenuSource::StaticPage, e.to_string()))?;

        let items = extract_from_html(&html, &self.rules);
        debug!("Static page extraction yielded {} items", items.len());
        Ok(items)
    }
}
