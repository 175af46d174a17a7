use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::menu::{CacheStatus, ClearOutcome, MenuItem, MenuService, MenuSnapshot};
use crate::utils::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<MenuItem>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

pub async fn get_menu(
    Extension(service): Extension<Arc<MenuService>>,
) -> Result<Json<MenuSnapshot>, ApiError> {
    let snapshot = service.fetch_menu().await?;
    Ok(Json(snapshot))
}

pub async fn search_menu(
    Extension(service): Extension<Arc<MenuService>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query parameter 'q' is empty".into()));
    }
    info!("Menu search: {}", query);

    let items = service.search(query).await?;
    let total = items.len();
    Ok(Json(ItemsResponse { items, total }))
}

pub async fn list_categories(
    Extension(service): Extension<Arc<MenuService>>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = service.categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

pub async fn get_category(
    Extension(service): Extension<Arc<MenuService>>,
    Path(name): Path<String>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let items = service.by_category(&name).await?;
    if items.is_empty() {
        return Err(ApiError::NotFound(format!("no category '{}'", name)));
    }
    let total = items.len();
    Ok(Json(ItemsResponse { items, total }))
}

pub async fn cache_status(
    Extension(service): Extension<Arc<MenuService>>,
) -> Json<CacheStatus> {
    Json(service.cache_status())
}

pub async fn clear_cache(
    Extension(service): Extension<Arc<MenuService>>,
) -> Json<ClearOutcome> {
    Json(service.clear_cache())
}
