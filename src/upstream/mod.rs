//! Clients for the services this backend calls but does not control.

mod inventory;
mod planner;
mod slack;

pub use inventory::{HttpInventorySource, InventoryPayload, InventorySource, SourceItem};
pub use planner::{
    DailyMeals, HttpMealPlanner, MealEntry, MealPlanner, PlanRequest, PlannedWeek,
    PlannerResponse, QuantityNeeded, ShoppingGap,
};
pub use slack::{Messenger, SlackMessenger};

use serde::de::DeserializeOwned;

pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} responded with HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} returned an unexpected payload: {reason}")]
    Payload { service: &'static str, reason: String },
    #[error("{service} reported status {status:?}")]
    Rejected { service: &'static str, status: String },
}

impl UpstreamError {
    fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { service, source }
    }
}

/// Rejects non-2xx responses and decodes the body against the expected contract.
async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    res: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = res.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
        });
    }
    let body = res.bytes().await.map_err(UpstreamError::transport(service))?;
    serde_json::from_slice(&body).map_err(|e| UpstreamError::Payload {
        service,
        reason: e.to_string(),
    })
}

fn ensure_success(service: &'static str, status: &str) -> Result<(), UpstreamError> {
    if status == SUCCESS_STATUS {
        Ok(())
    } else {
        Err(UpstreamError::Rejected {
            service,
            status: status.to_string(),
        })
    }
}
