use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub api_url: String,
    pub bot_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub planner_url: String,
    pub slack: SlackConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let planner_url =
            std::env::var("MEAL_PLANNER_URL").context("MEAL_PLANNER_URL must be set")?;
        let slack = SlackConfig {
            api_url: std::env::var("SLACK_API_URL")
                .unwrap_or_else(|_| "https://slack.com/api/chat.postMessage".into()),
            bot_token: std::env::var("SLACK_BOT_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        };
        Ok(Self {
            database_url,
            max_connections,
            planner_url,
            slack,
        })
    }
}
