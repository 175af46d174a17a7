use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

mod config;
mod handlers;
mod menu;
mod utils;

use config::Settings;
use menu::adapters::{
    MenuSourceAdapter, RenderedPageAdapter, StaticPageAdapter, StructuredEndpointAdapter,
};
use menu::{AcquisitionOrchestrator, MenuCache, MenuService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,menu_api_server=debug".to_string()),
        )
        .with_target(true)
        .json()
        .init();

    info!("🚀 Starting Menu API Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Acquisition stages, cheapest assumption first. The rendered-page stage
    // can be configured out entirely.
    let mut adapters: Vec<Box<dyn MenuSourceAdapter>> = Vec::new();
    adapters.push(Box::new(StructuredEndpointAdapter::new(&settings.menu)));
    if settings.browser.enabled {
        adapters.push(Box::new(RenderedPageAdapter::new(
            settings.menu.page_url.clone(),
            settings.browser.clone(),
        )));
    } else {
        info!("Rendered-page stage disabled by configuration");
    }
    adapters.push(Box::new(StaticPageAdapter::new(&settings.menu)));

    let orchestrator = Arc::new(AcquisitionOrchestrator::new(adapters));
    let cache = Arc::new(MenuCache::new(settings.cache.ttl_minutes));
    let menu_service = Arc::new(MenuService::new(orchestrator, cache));
    info!("✅ Menu pipeline initialized");

    // Build router
    let app = build_router(menu_service);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(menu_service: Arc<MenuService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/menu", get(handlers::menu::get_menu))
        .route("/api/menu/search", get(handlers::menu::search_menu))
        .route("/api/menu/categories", get(handlers::menu::list_categories))
        .route(
            "/api/menu/category/{name}",
            get(handlers::menu::get_category),
        )
        .route("/api/cache/status", get(handlers::menu::cache_status))
        .route("/api/cache/clear", post(handlers::menu::clear_cache))
        .route("/rpc", post(handlers::rpc::rpc_handler))
        .layer(Extension(menu_service))
        .layer(
            CorsLayer::permissive()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(CatchPanicLayer::new())
}
