pub mod settings;

pub use settings::{BrowserConfig, CacheConfig, MenuConfig, ServerConfig, Settings};
