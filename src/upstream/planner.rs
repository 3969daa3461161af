use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use super::{ensure_success, read_json, UpstreamError};
use crate::{dates::iso_date, db::InventoryItem};

const SERVICE: &str = "meal planner";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub title: String,
    pub ingredients_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMeals {
    pub date: String,
    pub breakfast: MealEntry,
    pub lunch: MealEntry,
    pub dinner: MealEntry,
}

/// Planners send either a bare number or a free-form amount ("2 cups").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityNeeded {
    Amount(f64),
    Text(String),
}

impl fmt::Display for QuantityNeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingGap {
    pub ingredient: String,
    pub quantity_needed: QuantityNeeded,
    pub used_for_meals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedWeek {
    pub week_start_date: String,
    pub daily_meals: Vec<DailyMeals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerResponse {
    pub status: String,
    pub meal_plan: PlannedWeek,
    pub shopping_gaps: Vec<ShoppingGap>,
}

impl PlannerResponse {
    /// Daily meals and shopping gaps of a response that reported success.
    pub fn into_parts(self) -> Result<(Vec<DailyMeals>, Vec<ShoppingGap>), UpstreamError> {
        ensure_success(SERVICE, &self.status)?;
        Ok((self.meal_plan.daily_meals, self.shopping_gaps))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest {
    #[serde(with = "iso_date")]
    pub week_start_date: Date,
    pub inventory: Vec<InventoryItem>,
}

#[async_trait]
pub trait MealPlanner: Send + Sync {
    async fn generate(&self, request: &PlanRequest) -> Result<PlannerResponse, UpstreamError>;
}

#[derive(Clone)]
pub struct HttpMealPlanner {
    client: reqwest::Client,
    url: String,
}

impl HttpMealPlanner {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MealPlanner for HttpMealPlanner {
    async fn generate(&self, request: &PlanRequest) -> Result<PlannerResponse, UpstreamError> {
        let res = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        let plan: PlannerResponse = read_json(SERVICE, res).await?;
        debug!(
            days = plan.meal_plan.daily_meals.len(),
            gaps = plan.shopping_gaps.len(),
            "meal plan received"
        );
        Ok(plan)
    }
}
