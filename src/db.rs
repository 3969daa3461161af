use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};

use crate::dates::iso_date;

/// Household connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub household_id: String,
    pub inventory_url: String,
    pub slack_channel: Option<String>,
    pub auto_notify: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    #[serde(with = "iso_date::option")]
    pub expiry_date: Option<Date>,
    pub is_expiring_soon: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Stored plan; both bodies are JSON text as produced at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: i64,
    pub account_id: i64,
    #[serde(with = "iso_date")]
    pub week_start_date: Date,
    pub daily_meals: String,
    pub shopping_gaps: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ConnectAccount {
    pub household_id: String,
    pub inventory_url: String,
    pub slack_channel: Option<String>,
    pub auto_notify: bool,
}

/// Partial settings update. `slack_channel: Some(None)` clears the channel.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub slack_channel: Option<Option<String>>,
    pub auto_notify: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub expiry_date: Option<Date>,
    pub is_expiring_soon: bool,
}

#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub account_id: i64,
    pub week_start_date: Date,
    pub daily_meals: String,
    pub shopping_gaps: String,
}

/// Persistence seam for accounts, inventory and meal plans.
///
/// Writes take the caller's reference instant and stamp `updated_at` with it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    async fn find_account(&self, id: i64) -> anyhow::Result<Option<Account>>;
    async fn find_account_by_household(&self, household_id: &str)
        -> anyhow::Result<Option<Account>>;
    /// Insert, or overwrite the settings of the row with the same household id.
    async fn upsert_account(
        &self,
        input: &ConnectAccount,
        now: OffsetDateTime,
    ) -> anyhow::Result<Account>;
    async fn update_account_settings(
        &self,
        id: i64,
        patch: &SettingsPatch,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Account>>;

    /// Atomically swap the account's inventory for `items`.
    async fn replace_inventory(
        &self,
        account_id: i64,
        items: &[NewInventoryItem],
        now: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// Ordered by expiry date (missing dates last), then name.
    async fn list_inventory(&self, account_id: i64) -> anyhow::Result<Vec<InventoryItem>>;

    async fn insert_meal_plan(
        &self,
        plan: &NewMealPlan,
        now: OffsetDateTime,
    ) -> anyhow::Result<MealPlan>;
    /// Newest plan stored for exactly that week start.
    async fn find_meal_plan_for_week(
        &self,
        account_id: i64,
        week_start: Date,
    ) -> anyhow::Result<Option<MealPlan>>;
    async fn list_meal_plans(&self, account_id: i64, limit: i64) -> anyhow::Result<Vec<MealPlan>>;
    async fn find_meal_plan_with_account(
        &self,
        plan_id: i64,
    ) -> anyhow::Result<Option<(MealPlan, Account)>>;
}

const ACCOUNT_COLUMNS: &str =
    "id, household_id, inventory_url, slack_channel, auto_notify, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, account_id, name, quantity, unit, expiry_date, is_expiring_soon, created_at, updated_at";
const PLAN_COLUMNS: &str =
    "id, account_id, week_start_date, daily_meals, shopping_gaps, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PlanWithAccountRow {
    plan_id: i64,
    week_start_date: Date,
    daily_meals: String,
    shopping_gaps: String,
    plan_created_at: OffsetDateTime,
    plan_updated_at: OffsetDateTime,
    account_id: i64,
    household_id: String,
    inventory_url: String,
    slack_channel: Option<String>,
    auto_notify: bool,
    account_created_at: OffsetDateTime,
    account_updated_at: OffsetDateTime,
}

impl From<PlanWithAccountRow> for (MealPlan, Account) {
    fn from(r: PlanWithAccountRow) -> Self {
        (
            MealPlan {
                id: r.plan_id,
                account_id: r.account_id,
                week_start_date: r.week_start_date,
                daily_meals: r.daily_meals,
                shopping_gaps: r.shopping_gaps,
                created_at: r.plan_created_at,
                updated_at: r.plan_updated_at,
            },
            Account {
                id: r.account_id,
                household_id: r.household_id,
                inventory_url: r.inventory_url,
                slack_channel: r.slack_channel,
                auto_notify: r.auto_notify,
                created_at: r.account_created_at,
                updated_at: r.account_updated_at,
            },
        )
    }
}

async fn insert_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    item: &NewInventoryItem,
    now: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_items
            (account_id, name, quantity, unit, expiry_date, is_expiring_soon, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(account_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(item.expiry_date) // Option<Date> → NULL allowed
    .bind(item.is_expiring_soon)
    .bind(now)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("insert inventory item {}", item.name))?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("ping database")?;
        Ok(())
    }

    async fn find_account(&self, id: i64) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find account")?;
        Ok(account)
    }

    async fn find_account_by_household(
        &self,
        household_id: &str,
    ) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE household_id = $1"
        ))
        .bind(household_id)
        .fetch_optional(&self.pool)
        .await
        .context("find account by household")?;
        Ok(account)
    }

    async fn upsert_account(
        &self,
        input: &ConnectAccount,
        now: OffsetDateTime,
    ) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts
                (household_id, inventory_url, slack_channel, auto_notify, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (household_id) DO UPDATE
               SET inventory_url = EXCLUDED.inventory_url,
                   slack_channel = EXCLUDED.slack_channel,
                   auto_notify   = EXCLUDED.auto_notify,
                   updated_at    = EXCLUDED.updated_at
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&input.household_id)
        .bind(&input.inventory_url)
        .bind(&input.slack_channel)
        .bind(input.auto_notify)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("upsert account")?;
        Ok(account)
    }

    async fn update_account_settings(
        &self,
        id: i64,
        patch: &SettingsPatch,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
               SET slack_channel = CASE WHEN $2 THEN $3 ELSE slack_channel END,
                   auto_notify   = COALESCE($4, auto_notify),
                   updated_at    = $5
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.slack_channel.is_some())
        .bind(patch.slack_channel.clone().flatten())
        .bind(patch.auto_notify)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .context("update account settings")?;
        Ok(account)
    }

    async fn replace_inventory(
        &self,
        account_id: i64,
        items: &[NewInventoryItem],
        now: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM inventory_items WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .context("clear inventory")?;
        for item in items {
            insert_item_tx(&mut tx, account_id, item, now).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn list_inventory(&self, account_id: i64) -> anyhow::Result<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
              FROM inventory_items
             WHERE account_id = $1
             ORDER BY expiry_date ASC NULLS LAST, name ASC
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("list inventory")?;
        Ok(rows)
    }

    async fn insert_meal_plan(
        &self,
        plan: &NewMealPlan,
        now: OffsetDateTime,
    ) -> anyhow::Result<MealPlan> {
        let row = sqlx::query_as::<_, MealPlan>(&format!(
            r#"
            INSERT INTO meal_plans
                (account_id, week_start_date, daily_meals, shopping_gaps, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan.account_id)
        .bind(plan.week_start_date)
        .bind(&plan.daily_meals)
        .bind(&plan.shopping_gaps)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("insert meal plan")?;
        Ok(row)
    }

    async fn find_meal_plan_for_week(
        &self,
        account_id: i64,
        week_start: Date,
    ) -> anyhow::Result<Option<MealPlan>> {
        let row = sqlx::query_as::<_, MealPlan>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
              FROM meal_plans
             WHERE account_id = $1 AND week_start_date = $2
             ORDER BY created_at DESC, id DESC
             LIMIT 1
            "#
        ))
        .bind(account_id)
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await
        .context("find meal plan for week")?;
        Ok(row)
    }

    async fn list_meal_plans(&self, account_id: i64, limit: i64) -> anyhow::Result<Vec<MealPlan>> {
        let rows = sqlx::query_as::<_, MealPlan>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
              FROM meal_plans
             WHERE account_id = $1
             ORDER BY week_start_date DESC, id DESC
             LIMIT $2
            "#
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("list meal plans")?;
        Ok(rows)
    }

    async fn find_meal_plan_with_account(
        &self,
        plan_id: i64,
    ) -> anyhow::Result<Option<(MealPlan, Account)>> {
        let row = sqlx::query_as::<_, PlanWithAccountRow>(
            r#"
            SELECT p.id              AS plan_id,
                   p.week_start_date,
                   p.daily_meals,
                   p.shopping_gaps,
                   p.created_at      AS plan_created_at,
                   p.updated_at      AS plan_updated_at,
                   a.id              AS account_id,
                   a.household_id,
                   a.inventory_url,
                   a.slack_channel,
                   a.auto_notify,
                   a.created_at      AS account_created_at,
                   a.updated_at      AS account_updated_at
              FROM meal_plans p
              JOIN accounts a ON a.id = p.account_id
             WHERE p.id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .context("find meal plan with account")?;
        Ok(row.map(Into::into))
    }
}
