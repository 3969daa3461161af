use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::services;
use crate::{db::InventoryItem, error::ApiResult, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/accounts/:id/inventory", get(list_inventory))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/accounts/:id/inventory/refresh", post(refresh_inventory))
}

#[instrument(skip(state))]
pub async fn refresh_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let Path(id) = id?;
    let items = services::refresh(&state, id, OffsetDateTime::now_utc()).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let Path(id) = id?;
    let items = services::list(&state, id, OffsetDateTime::now_utc()).await?;
    Ok(Json(items))
}
