pub mod adapters;
pub mod cache;
pub mod error;
pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod service;

pub use cache::{CacheStatus, ClearOutcome, MenuCache};
pub use error::MenuError;
pub use model::{MenuItem, MenuSnapshot, MenuSource};
pub use orchestrator::AcquisitionOrchestrator;
pub use service::{MenuProvider, MenuService};
