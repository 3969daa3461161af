use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{GenerateRequest, ListQuery, MealPlanResponse, WeekQuery};
use super::services;
use crate::{error::ApiResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/:id/meal-plans",
            get(list_meal_plans).post(generate_meal_plan),
        )
        .route("/accounts/:id/meal-plans/week", get(get_meal_plan))
}

/// POST /accounts/:id/meal-plans { week_start_date?: "YYYY-MM-DD" }; the body may be omitted.
#[instrument(skip(state, headers, body))]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MealPlanResponse>)> {
    let Path(id) = id?;
    let req = GenerateRequest::from_body(&headers, &body)?;
    let now = OffsetDateTime::now_utc();
    let plan = services::generate(&state, id, req.week_start_date.as_deref(), now).await?;
    Ok((StatusCode::CREATED, Json(plan.into())))
}

#[instrument(skip(state))]
pub async fn get_meal_plan(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> ApiResult<Json<Option<MealPlanResponse>>> {
    let Path(id) = id?;
    let Query(q) = query?;
    let now = OffsetDateTime::now_utc();
    let plan = services::get_for_week(&state, id, q.week_start_date.as_deref(), now).await?;
    Ok(Json(plan.map(Into::into)))
}

#[instrument(skip(state))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MealPlanResponse>>> {
    let Path(id) = id?;
    let Query(q) = query?;
    let plans = services::list_recent(&state, id, q.limit).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}
