use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};

use crate::state::AppState;

/// Upstreams are mocked stand-ins and are not probed.
const EXTERNAL_SERVICES_AVAILABLE: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Error,
}

impl HealthStatus {
    pub fn from_checks(database: bool, external_services: bool) -> Self {
        match (database, external_services) {
            (false, _) => Self::Error,
            (true, false) => Self::Degraded,
            (true, true) => Self::Ok,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub database: bool,
    pub external_services: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// GET /health
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database unreachable");
            false
        }
    };
    let status = HealthStatus::from_checks(database, EXTERNAL_SERVICES_AVAILABLE);
    let code = if status == HealthStatus::Error {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (
        code,
        Json(HealthReport {
            status,
            database,
            external_services: EXTERNAL_SERVICES_AVAILABLE,
            timestamp: OffsetDateTime::now_utc(),
        }),
    )
}
