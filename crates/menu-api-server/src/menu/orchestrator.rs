use tracing::{debug, info, warn};

use super::adapters::MenuSourceAdapter;
use super::error::MenuError;
use super::model::{MenuItem, MenuSnapshot};

/// Item names longer than this are assumed to be leaked page internals.
const MAX_NAME_LENGTH: usize = 500;

/// Substrings that mark an extracted "item" as leaked script or config text
/// rather than menu content (executable code fragments, embedded coordinates,
/// tenant/config identifiers).
const CORRUPTION_MARKERS: [&str; 10] = [
    "function",
    "=>",
    "window.",
    "document.",
    "var ",
    "</script",
    "latitude",
    "longitude",
    "tenant",
    "apikey",
];

/// Runs the source adapters in priority order, short-circuiting on the first
/// one that yields a non-empty, non-corrupted result. Each stage is attempted
/// exactly once per run; stage-local failures are logged and swallowed here.
pub struct AcquisitionOrchestrator {
    adapters: Vec<Box<dyn MenuSourceAdapter>>,
}

impl AcquisitionOrchestrator {
    pub fn new(adapters: Vec<Box<dyn MenuSourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Acquire a fresh snapshot, or raise `AcquisitionFailed` once every
    /// stage is exhausted. Never returns an empty snapshot as success.
    pub async fn acquire(&self) -> Result<MenuSnapshot, MenuError> {
        for adapter in &self.adapters {
            let source = adapter.source();
            debug!("Attempting acquisition via {}", source);

            let items = match adapter.acquire().await {
                Ok(items) => items,
                Err(e) => {
                    warn!("{} stage failed: {}", source, e);
                    continue;
                }
            };

            if items.is_empty() {
                warn!("{} stage yielded zero items, falling through", source);
                continue;
            }

            if let Err(e) = validate_items(&items) {
                warn!("{} stage rejected: {}", source, e);
                continue;
            }

            info!("Acquired {} menu items via {}", items.len(), source);
            return Ok(MenuSnapshot::new(items, source));
        }

        Err(MenuError::AcquisitionFailed(
            "all acquisition stages exhausted without a valid menu".into(),
        ))
    }
}

/// Reject results whose extraction heuristics captured non-menu page content.
pub fn validate_items(items: &[MenuItem]) -> Result<(), MenuError> {
    for item in items {
        if item.name.len() > MAX_NAME_LENGTH {
            return Err(MenuError::Corrupted(format!(
                "item name of {} chars exceeds sanity bound",
                item.name.len()
            )));
        }
        let lowered = item.name.to_lowercase();
        for marker in CORRUPTION_MARKERS {
            if lowered.contains(marker) {
                return Err(MenuError::Corrupted(format!(
                    "item name contains leaked page content ('{}')",
                    marker
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::adapters::MockMenuSourceAdapter;
    use crate::menu::model::MenuSource;

    fn sample_items() -> Vec<MenuItem> {
        vec![MenuItem::new("Espresso", "", "$3.50", "COFFEE")]
    }

    fn mock_adapter(
        source: MenuSource,
        result: Result<Vec<MenuItem>, MenuError>,
    ) -> Box<dyn MenuSourceAdapter> {
        let mut mock = MockMenuSourceAdapter::new();
        mock.expect_source().return_const(source);
        mock.expect_acquire().times(1).return_once(move || result);
        Box::new(mock)
    }

    fn skipped_adapter(source: MenuSource) -> Box<dyn MenuSourceAdapter> {
        let mut mock = MockMenuSourceAdapter::new();
        mock.expect_source().return_const(source);
        mock.expect_acquire().times(0);
        Box::new(mock)
    }

    #[tokio::test]
    async fn test_first_stage_win_short_circuits() {
        let orchestrator = AcquisitionOrchestrator::new(vec![
            mock_adapter(MenuSource::StructuredEndpoint, Ok(sample_items())),
            skipped_adapter(MenuSource::RenderedPage),
            skipped_adapter(MenuSource::StaticPage),
        ]);

        let snapshot = orchestrator.acquire().await.unwrap();
        assert_eq!(snapshot.source, MenuSource::StructuredEndpoint);
        assert_eq!(snapshot.item_count(), 1);
        assert_eq!(snapshot.categories, vec!["COFFEE"]);
    }

    #[tokio::test]
    async fn test_fallthrough_on_zero_items_then_errors() {
        let orchestrator = AcquisitionOrchestrator::new(vec![
            mock_adapter(MenuSource::StructuredEndpoint, Ok(Vec::new())),
            mock_adapter(
                MenuSource::RenderedPage,
                Err(MenuError::adapter(MenuSource::RenderedPage, "boom")),
            ),
            mock_adapter(MenuSource::StaticPage, Ok(sample_items())),
        ]);

        let snapshot = orchestrator.acquire().await.unwrap();
        assert_eq!(snapshot.source, MenuSource::StaticPage);
    }

    #[tokio::test]
    async fn test_all_stages_exhausted_raises() {
        let orchestrator = AcquisitionOrchestrator::new(vec![
            mock_adapter(MenuSource::StructuredEndpoint, Ok(Vec::new())),
            mock_adapter(
                MenuSource::RenderedPage,
                Err(MenuError::adapter(MenuSource::RenderedPage, "timeout")),
            ),
            mock_adapter(MenuSource::StaticPage, Ok(Vec::new())),
        ]);

        let err = orchestrator.acquire().await.unwrap_err();
        assert!(matches!(err, MenuError::AcquisitionFailed(_)));
    }

    #[tokio::test]
    async fn test_corrupted_result_falls_through() {
        let corrupted = vec![MenuItem::new(
            "window.__config = { tenantId: 42 }",
            "",
            "$0.00",
            "General",
        )];
        let orchestrator = AcquisitionOrchestrator::new(vec![
            mock_adapter(MenuSource::StructuredEndpoint, Ok(corrupted)),
            mock_adapter(MenuSource::RenderedPage, Ok(sample_items())),
        ]);

        let snapshot = orchestrator.acquire().await.unwrap();
        assert_eq!(snapshot.source, MenuSource::RenderedPage);
    }

    #[test]
    fn test_validate_rejects_script_leakage() {
        let items = vec![MenuItem::new(
            "function renderMenu() { return null; }",
            "",
            "$1.00",
            "General",
        )];
        assert!(validate_items(&items).is_err());
    }

    #[test]
    fn test_validate_rejects_extreme_length() {
        let items = vec![MenuItem::new("x".repeat(501), "", "$1.00", "General")];
        assert!(validate_items(&items).is_err());
    }

    #[test]
    fn test_validate_accepts_normal_items() {
        assert!(validate_items(&sample_items()).is_ok());
    }
}
