use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::{CacheStatus, ClearOutcome, MenuCache};
use super::error::MenuError;
use super::model::{MenuItem, MenuSnapshot};
use super::orchestrator::AcquisitionOrchestrator;

/// Anything that can produce a fresh menu snapshot. Implemented by the
/// acquisition orchestrator; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuProvider: Send + Sync {
    async fn acquire(&self) -> Result<MenuSnapshot, MenuError>;
}

#[async_trait]
impl MenuProvider for AcquisitionOrchestrator {
    async fn acquire(&self) -> Result<MenuSnapshot, MenuError> {
        AcquisitionOrchestrator::acquire(self).await
    }
}

/// Query facade over the acquisition pipeline. Owns the refresh policy:
/// fresh cache hit, else acquire and cache, else stale fallback, else
/// `NoDataAvailable`.
pub struct MenuService {
    provider: Arc<dyn MenuProvider>,
    cache: Arc<MenuCache>,
}

impl MenuService {
    pub fn new(provider: Arc<dyn MenuProvider>, cache: Arc<MenuCache>) -> Self {
        Self { provider, cache }
    }

    /// The full current menu, served from cache when fresh.
    pub async fn fetch_menu(&self) -> Result<MenuSnapshot, MenuError> {
        if let Some(snapshot) = self.cache.get() {
            debug!("Serving menu from cache ({} items)", snapshot.item_count());
            return Ok(snapshot);
        }

        match self.provider.acquire().await {
            Ok(snapshot) => {
                self.cache.put(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Acquisition failed: {}", e);
                if let Some(stale) = self.cache.get_stale() {
                    info!(
                        "Serving stale cache entry as degraded fallback ({} items)",
                        stale.item_count()
                    );
                    return Ok(stale);
                }
                Err(MenuError::NoDataAvailable(e.to_string()))
            }
        }
    }

    /// Case-insensitive substring search over name, description, category.
    pub async fn search(&self, query: &str) -> Result<Vec<MenuItem>, MenuError> {
        let needle = query.to_lowercase();
        let snapshot = self.fetch_menu().await?;
        Ok(snapshot
            .items
            .into_iter()
            .filter(|item| {
                item.name.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
                    || item.category.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Items in a category, matched case-insensitively.
    pub async fn by_category(&self, category: &str) -> Result<Vec<MenuItem>, MenuError> {
        let wanted = category.to_lowercase();
        let snapshot = self.fetch_menu().await?;
        Ok(snapshot
            .items
            .into_iter()
            .filter(|item| item.category.to_lowercase() == wanted)
            .collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>, MenuError> {
        Ok(self.fetch_menu().await?.categories)
    }

    pub fn clear_cache(&self) -> ClearOutcome {
        self.cache.clear()
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }
}
