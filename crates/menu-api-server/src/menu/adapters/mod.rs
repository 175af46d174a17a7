pub mod endpoint;
pub mod rendered;
pub mod static_page;

use async_trait::async_trait;

use super::error::MenuError;
use super::model::{MenuItem, MenuSource};

pub use endpoint::StructuredEndpointAdapter;
pub use rendered::RenderedPageAdapter;
pub use static_page::StaticPageAdapter;

/// One strategy for acquiring menu data from the upstream source.
///
/// Adapters are tried by the orchestrator in a fixed priority order; each
/// attempt either yields the items it discovered or a stage-local error.
/// Zero items is not an error at this seam; the orchestrator treats it as
/// a failed stage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuSourceAdapter: Send + Sync {
    /// Tag recorded on snapshots produced by this adapter.
    fn source(&self) -> MenuSource;

    async fn acquire(&self) -> Result<Vec<MenuItem>, MenuError>;
}
