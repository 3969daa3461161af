use serde::Serialize;
use tracing::{info, warn};

use super::render::render_meal_plan;
use crate::{
    state::AppState,
    upstream::{DailyMeals, ShoppingGap},
};

pub const PLAN_NOT_FOUND: &str = "Meal plan not found";
pub const NO_CHANNEL: &str = "User does not have a Slack channel configured";
pub const INVALID_PLAN_DATA: &str = "Invalid meal plan data format";
pub const SENT: &str = "Meal plan sent to Slack successfully";

/// Outcome of a delivery attempt; failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl DeliveryResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            channel: None,
        }
    }
}

/// Render a stored plan and post it to its account's Slack channel.
pub async fn send_meal_plan(st: &AppState, meal_plan_id: i64) -> DeliveryResult {
    let (plan, account) = match st.store.find_meal_plan_with_account(meal_plan_id).await {
        Ok(Some(found)) => found,
        Ok(None) => return DeliveryResult::failed(PLAN_NOT_FOUND),
        Err(e) => {
            warn!(error = %e, meal_plan_id, "meal plan lookup failed");
            return DeliveryResult::failed(e.to_string());
        }
    };

    let Some(channel) = account.slack_channel else {
        return DeliveryResult::failed(NO_CHANNEL);
    };

    let parsed = serde_json::from_str::<Vec<DailyMeals>>(&plan.daily_meals).and_then(|days| {
        serde_json::from_str::<Vec<ShoppingGap>>(&plan.shopping_gaps).map(|gaps| (days, gaps))
    });
    let (days, gaps) = match parsed {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, meal_plan_id, "stored meal plan is not valid JSON");
            return DeliveryResult::failed(INVALID_PLAN_DATA);
        }
    };

    let text = render_meal_plan(plan.week_start_date, &days, &gaps);
    if let Err(e) = st.messenger.post_message(&channel, &text).await {
        warn!(error = %e, meal_plan_id, %channel, "slack delivery failed");
        return DeliveryResult::failed(e.to_string());
    }

    info!(meal_plan_id, account_id = account.id, %channel, "meal plan sent to slack");
    DeliveryResult {
        success: true,
        message: SENT.into(),
        channel: Some(channel),
    }
}
