use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::db::{PgStore, Store};
use crate::upstream::{
    HttpInventorySource, HttpMealPlanner, InventorySource, MealPlanner, Messenger, SlackMessenger,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub inventory: Arc<dyn InventorySource>,
    pub planner: Arc<dyn MealPlanner>,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("pantryplan/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;

        let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
        let inventory: Arc<dyn InventorySource> = Arc::new(HttpInventorySource::new(http.clone()));
        let planner: Arc<dyn MealPlanner> =
            Arc::new(HttpMealPlanner::new(http.clone(), &config.planner_url));
        let messenger: Arc<dyn Messenger> = Arc::new(SlackMessenger::new(http, &config.slack));

        Ok(Self::from_parts(store, inventory, planner, messenger))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        inventory: Arc<dyn InventorySource>,
        planner: Arc<dyn MealPlanner>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store,
            inventory,
            planner,
            messenger,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::Harness::new().state
    }
}
