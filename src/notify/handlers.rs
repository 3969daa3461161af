use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::services::{self, DeliveryResult};
use crate::{error::ApiResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/meal-plans/:id/slack", post(send_to_slack))
}

/// POST /meal-plans/:id/slack answers 200 with the delivery result, whatever it is.
#[instrument(skip(state))]
pub async fn send_to_slack(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<DeliveryResult>> {
    let Path(id) = id?;
    Ok(Json(services::send_meal_plan(&state, id).await))
}
