//! In-memory store and scripted upstream fakes for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::db::{
    Account, ConnectAccount, InventoryItem, MealPlan, NewInventoryItem, NewMealPlan,
    SettingsPatch, Store,
};
use crate::state::AppState;
use crate::upstream::{
    DailyMeals, InventoryPayload, InventorySource, MealEntry, MealPlanner, Messenger,
    PlanRequest, PlannedWeek, PlannerResponse, QuantityNeeded, ShoppingGap, UpstreamError,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    accounts: Vec<Account>,
    items: Vec<InventoryItem>,
    plans: Vec<MealPlan>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub offline: AtomicBool,
}

impl MemoryStore {
    pub fn accounts(&self) -> Vec<Account> {
        self.tables.lock().unwrap().accounts.clone()
    }

    pub fn plans(&self) -> Vec<MealPlan> {
        self.tables.lock().unwrap().plans.clone()
    }

    /// Overwrite a stored plan body, bypassing generation.
    pub fn corrupt_plan(&self, plan_id: i64, daily_meals: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(p) = t.plans.iter_mut().find(|p| p.id == plan_id) {
            p.daily_meals = daily_meals.to_string();
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    async fn find_account(&self, id: i64) -> anyhow::Result<Option<Account>> {
        let t = self.tables.lock().unwrap();
        Ok(t.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_household(
        &self,
        household_id: &str,
    ) -> anyhow::Result<Option<Account>> {
        let t = self.tables.lock().unwrap();
        Ok(t.accounts
            .iter()
            .find(|a| a.household_id == household_id)
            .cloned())
    }

    async fn upsert_account(
        &self,
        input: &ConnectAccount,
        now: OffsetDateTime,
    ) -> anyhow::Result<Account> {
        let mut t = self.tables.lock().unwrap();
        if let Some(a) = t
            .accounts
            .iter_mut()
            .find(|a| a.household_id == input.household_id)
        {
            a.inventory_url = input.inventory_url.clone();
            a.slack_channel = input.slack_channel.clone();
            a.auto_notify = input.auto_notify;
            a.updated_at = now;
            return Ok(a.clone());
        }
        let account = Account {
            id: t.next_id(),
            household_id: input.household_id.clone(),
            inventory_url: input.inventory_url.clone(),
            slack_channel: input.slack_channel.clone(),
            auto_notify: input.auto_notify,
            created_at: now,
            updated_at: now,
        };
        t.accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account_settings(
        &self,
        id: i64,
        patch: &SettingsPatch,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Account>> {
        let mut t = self.tables.lock().unwrap();
        let Some(a) = t.accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(channel) = &patch.slack_channel {
            a.slack_channel = channel.clone();
        }
        if let Some(flag) = patch.auto_notify {
            a.auto_notify = flag;
        }
        a.updated_at = now;
        Ok(Some(a.clone()))
    }

    async fn replace_inventory(
        &self,
        account_id: i64,
        items: &[NewInventoryItem],
        now: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut t = self.tables.lock().unwrap();
        t.items.retain(|i| i.account_id != account_id);
        for item in items {
            let id = t.next_id();
            t.items.push(InventoryItem {
                id,
                account_id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                expiry_date: item.expiry_date,
                is_expiring_soon: item.is_expiring_soon,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn list_inventory(&self, account_id: i64) -> anyhow::Result<Vec<InventoryItem>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = t
            .items
            .iter()
            .filter(|i| i.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| match (a.expiry_date, b.expiry_date) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
        Ok(rows)
    }

    async fn insert_meal_plan(
        &self,
        plan: &NewMealPlan,
        now: OffsetDateTime,
    ) -> anyhow::Result<MealPlan> {
        let mut t = self.tables.lock().unwrap();
        let row = MealPlan {
            id: t.next_id(),
            account_id: plan.account_id,
            week_start_date: plan.week_start_date,
            daily_meals: plan.daily_meals.clone(),
            shopping_gaps: plan.shopping_gaps.clone(),
            created_at: now,
            updated_at: now,
        };
        t.plans.push(row.clone());
        Ok(row)
    }

    async fn find_meal_plan_for_week(
        &self,
        account_id: i64,
        week_start: Date,
    ) -> anyhow::Result<Option<MealPlan>> {
        let t = self.tables.lock().unwrap();
        Ok(t.plans
            .iter()
            .filter(|p| p.account_id == account_id && p.week_start_date == week_start)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn list_meal_plans(&self, account_id: i64, limit: i64) -> anyhow::Result<Vec<MealPlan>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = t
            .plans
            .iter()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.week_start_date
                .cmp(&a.week_start_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn find_meal_plan_with_account(
        &self,
        plan_id: i64,
    ) -> anyhow::Result<Option<(MealPlan, Account)>> {
        let t = self.tables.lock().unwrap();
        let Some(plan) = t.plans.iter().find(|p| p.id == plan_id) else {
            return Ok(None);
        };
        Ok(t.accounts
            .iter()
            .find(|a| a.id == plan.account_id)
            .map(|a| (plan.clone(), a.clone())))
    }
}

/// Inventory source answering from a queue; an empty queue reports an error status.
#[derive(Default)]
pub struct FakeInventorySource {
    replies: Mutex<VecDeque<Result<InventoryPayload, UpstreamError>>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeInventorySource {
    pub fn push(&self, reply: Result<InventoryPayload, UpstreamError>) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl InventorySource for FakeInventorySource {
    async fn fetch(
        &self,
        endpoint: &str,
        household_id: &str,
    ) -> Result<InventoryPayload, UpstreamError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), household_id.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(InventoryPayload { status: "error".into(), items: vec![] }))
    }
}

#[derive(Default)]
pub struct FakePlanner {
    replies: Mutex<VecDeque<Result<PlannerResponse, UpstreamError>>>,
    pub requests: Mutex<Vec<PlanRequest>>,
}

impl FakePlanner {
    pub fn push(&self, reply: Result<PlannerResponse, UpstreamError>) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl MealPlanner for FakePlanner {
    async fn generate(&self, request: &PlanRequest) -> Result<PlannerResponse, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_plan()))
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail_with: Mutex<Option<String>>,
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), UpstreamError> {
        if let Some(status) = self.fail_with.lock().unwrap().clone() {
            return Err(UpstreamError::Rejected {
                service: "slack",
                status,
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

fn meal(title: &str, summary: &str) -> MealEntry {
    MealEntry {
        title: title.into(),
        ingredients_summary: summary.into(),
    }
}

/// Two-day plan with one shopping gap.
pub fn sample_plan() -> PlannerResponse {
    PlannerResponse {
        status: "success".into(),
        meal_plan: PlannedWeek {
            week_start_date: "2024-12-16".into(),
            daily_meals: vec![
                DailyMeals {
                    date: "2024-12-16".into(),
                    breakfast: meal("Oatmeal", "oats, milk"),
                    lunch: meal("Tomato soup", "tomatoes, onion"),
                    dinner: meal("Pasta", "pasta, garlic"),
                },
                DailyMeals {
                    date: "2024-12-17".into(),
                    breakfast: meal("Omelette", "eggs, cheese"),
                    lunch: meal("Salad", "lettuce, cucumber"),
                    dinner: meal("Stir fry", "rice, peppers"),
                },
            ],
        },
        shopping_gaps: vec![ShoppingGap {
            ingredient: "Eggs".into(),
            quantity_needed: QuantityNeeded::Amount(6.0),
            used_for_meals: vec!["Omelette".into()],
        }],
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub inventory: Arc<FakeInventorySource>,
    pub planner: Arc<FakePlanner>,
    pub messenger: Arc<FakeMessenger>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let inventory = Arc::new(FakeInventorySource::default());
        let planner = Arc::new(FakePlanner::default());
        let messenger = Arc::new(FakeMessenger::default());
        let state = AppState::from_parts(
            store.clone(),
            inventory.clone(),
            planner.clone(),
            messenger.clone(),
        );
        Self {
            state,
            store,
            inventory,
            planner,
            messenger,
        }
    }

    /// Stores an account directly and returns it.
    pub async fn account(
        &self,
        household_id: &str,
        channel: Option<&str>,
        auto_notify: bool,
    ) -> Account {
        self.store
            .upsert_account(
                &ConnectAccount {
                    household_id: household_id.into(),
                    inventory_url: format!("http://inventory.test/{household_id}"),
                    slack_channel: channel.map(Into::into),
                    auto_notify,
                },
                OffsetDateTime::now_utc(),
            )
            .await
            .unwrap()
    }
}
