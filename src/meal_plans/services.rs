use anyhow::Context;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    dates::{current_week_start, parse_date, week_start},
    db::{MealPlan, NewMealPlan},
    error::{ApiResult, AppError},
    notify,
    state::AppState,
    upstream::PlanRequest,
};

pub const DEFAULT_LIST_LIMIT: i64 = 10;

fn parse_week_input(raw: &str) -> ApiResult<Date> {
    parse_date(raw).ok_or_else(|| {
        AppError::validation(format!("Invalid week_start_date {raw:?}; expected YYYY-MM-DD"))
    })
}

/// Monday of the supplied date's week, or of the current week.
pub fn resolve_week_start(raw: Option<&str>, now: OffsetDateTime) -> ApiResult<Date> {
    match raw {
        Some(r) => parse_week_input(r).map(week_start),
        None => Ok(current_week_start(now)),
    }
}

/// Generate and store a plan; notification, when enabled, runs after the insert.
pub async fn generate(
    st: &AppState,
    account_id: i64,
    week_start_date: Option<&str>,
    now: OffsetDateTime,
) -> ApiResult<MealPlan> {
    let week = resolve_week_start(week_start_date, now)?;
    let account = st
        .store
        .find_account(account_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

    let inventory = crate::inventory::services::list(st, account.id, now).await?;

    let request = PlanRequest {
        week_start_date: week,
        inventory,
    };
    let (daily_meals, shopping_gaps) = st.planner.generate(&request).await?.into_parts()?;

    let new_plan = NewMealPlan {
        account_id: account.id,
        week_start_date: week,
        daily_meals: serde_json::to_string(&daily_meals).context("serialize daily meals")?,
        shopping_gaps: serde_json::to_string(&shopping_gaps).context("serialize shopping gaps")?,
    };
    let plan = st.store.insert_meal_plan(&new_plan, now).await?;
    info!(
        account_id = account.id,
        meal_plan_id = plan.id,
        week_start = %plan.week_start_date,
        days = daily_meals.len(),
        gaps = shopping_gaps.len(),
        "meal plan generated"
    );

    if account.auto_notify && account.slack_channel.is_some() {
        let outcome = notify::services::send_meal_plan(st, plan.id).await;
        if outcome.success {
            info!(meal_plan_id = plan.id, "meal plan auto-sent");
        } else {
            warn!(meal_plan_id = plan.id, message = %outcome.message, "auto-send failed");
        }
    }

    Ok(plan)
}

/// Newest plan for the given week start. An explicit date is matched as given;
/// only the default is normalized to this week's Monday.
pub async fn get_for_week(
    st: &AppState,
    account_id: i64,
    week_start_date: Option<&str>,
    now: OffsetDateTime,
) -> ApiResult<Option<MealPlan>> {
    let week = match week_start_date {
        Some(raw) => parse_week_input(raw)?,
        None => current_week_start(now),
    };
    Ok(st.store.find_meal_plan_for_week(account_id, week).await?)
}

pub async fn list_recent(
    st: &AppState,
    account_id: i64,
    limit: Option<i64>,
) -> ApiResult<Vec<MealPlan>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 {
        return Err(AppError::validation("limit must be a positive number"));
    }
    Ok(st.store.list_meal_plans(account_id, limit).await?)
}
