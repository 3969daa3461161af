use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    dates::iso_date,
    db::MealPlan,
    error::{ApiResult, AppError},
};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub week_start_date: Option<String>,
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

impl GenerateRequest {
    /// An empty body means "no date"; anything else must be a JSON object of this shape.
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        if !is_json_content_type(headers) {
            return Err(AppError::validation(
                "Expected request with `Content-Type: application/json`",
            ));
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    #[serde(default)]
    pub week_start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Stored plan with its text bodies expanded back into JSON.
#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub id: i64,
    pub account_id: i64,
    #[serde(with = "iso_date")]
    pub week_start_date: Date,
    pub daily_meals: serde_json::Value,
    pub shopping_gaps: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn expand(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}

impl From<MealPlan> for MealPlanResponse {
    fn from(p: MealPlan) -> Self {
        Self {
            id: p.id,
            account_id: p.account_id,
            week_start_date: p.week_start_date,
            daily_meals: expand(p.daily_meals),
            shopping_gaps: expand(p.shopping_gaps),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
