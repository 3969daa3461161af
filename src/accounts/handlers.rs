use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{ConnectRequest, HouseholdQuery, UpdateSettingsRequest};
use super::services;
use crate::{db::Account, error::ApiResult, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/accounts", get(get_by_household))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/connect", post(connect))
        .route("/accounts/:id/settings", patch(update_settings))
}

/// POST /accounts/connect
#[instrument(skip(state, body))]
pub async fn connect(
    State(state): State<AppState>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Json(body) = body?;
    let account = services::connect(&state, body, OffsetDateTime::now_utc()).await?;
    Ok(Json(account))
}

/// PATCH /accounts/:id/settings
#[instrument(skip(state, body))]
pub async fn update_settings(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let account = services::update_settings(&state, id, body, OffsetDateTime::now_utc()).await?;
    Ok(Json(account))
}

/// GET /accounts?household_id=… answers `null` when nothing matches.
#[instrument(skip(state))]
pub async fn get_by_household(
    State(state): State<AppState>,
    query: Result<Query<HouseholdQuery>, QueryRejection>,
) -> ApiResult<Json<Option<Account>>> {
    let Query(q) = query?;
    let account = services::get_by_household(&state, &q.household_id).await?;
    Ok(Json(account))
}
