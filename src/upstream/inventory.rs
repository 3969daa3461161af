use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use super::{ensure_success, read_json, UpstreamError};
use crate::dates::iso_date;

const SERVICE: &str = "inventory source";
pub const HOUSEHOLD_HEADER: &str = "X-Household-Id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    #[serde(default, with = "iso_date::option")]
    pub expiry_date: Option<Date>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryPayload {
    pub status: String,
    pub items: Vec<SourceItem>,
}

impl InventoryPayload {
    #[cfg(test)]
    pub fn success(items: Vec<SourceItem>) -> Self {
        Self {
            status: super::SUCCESS_STATUS.into(),
            items,
        }
    }

    /// Items of a payload that reported success.
    pub fn into_items(self) -> Result<Vec<SourceItem>, UpstreamError> {
        ensure_success(SERVICE, &self.status)?;
        Ok(self.items)
    }
}

#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch(&self, endpoint: &str, household_id: &str)
        -> Result<InventoryPayload, UpstreamError>;
}

#[derive(Clone)]
pub struct HttpInventorySource {
    client: reqwest::Client,
}

impl HttpInventorySource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InventorySource for HttpInventorySource {
    async fn fetch(
        &self,
        endpoint: &str,
        household_id: &str,
    ) -> Result<InventoryPayload, UpstreamError> {
        let res = self
            .client
            .get(endpoint)
            .header(HOUSEHOLD_HEADER, household_id)
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        let payload: InventoryPayload = read_json(SERVICE, res).await?;
        debug!(%household_id, items = payload.items.len(), "inventory fetched");
        Ok(payload)
    }
}
