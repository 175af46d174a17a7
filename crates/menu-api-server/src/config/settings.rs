use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub menu: MenuConfig,
    pub browser: BrowserConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MenuConfig {
    /// Public menu page (static fetch + browser navigation target).
    pub page_url: String,
    /// Candidate structured JSON endpoints, probed in order.
    pub endpoint_urls: Vec<String>,
    pub endpoint_timeout_seconds: u64,
    pub fetch_timeout_seconds: u64,
    /// Disable certificate verification for upstreams with broken TLS chains.
    pub verify_tls: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrowserConfig {
    /// Turns the rendered-page stage off entirely when false.
    pub enabled: bool,
    pub navigation_timeout_seconds: u64,
    /// Fixed settle delay after DOM readiness, safety margin only.
    pub settle_delay_ms: u64,
    /// Bounded wait for the menu marker element before proceeding anyway.
    pub marker_wait_ms: u64,
    /// Bounded per-category wait for price-bearing content.
    pub category_wait_ms: u64,
    pub tab_selector: String,
    pub marker_selector: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub ttl_minutes: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(true))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}
