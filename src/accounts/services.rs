use time::OffsetDateTime;
use tracing::info;

use super::dto::{ConnectRequest, UpdateSettingsRequest};
use crate::{
    db::{Account, ConnectAccount, SettingsPatch},
    error::{ApiResult, AppError},
    state::AppState,
};

/// Channel names are passed to the messenger as given; it rejects unknown ones.
pub(crate) fn is_valid_channel(channel: &str) -> bool {
    !channel.trim().is_empty()
}

pub(crate) fn is_valid_inventory_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

fn check_channel(channel: Option<&str>) -> ApiResult<()> {
    match channel {
        Some(c) if !is_valid_channel(c) => {
            Err(AppError::validation("slack_channel must not be blank"))
        }
        _ => Ok(()),
    }
}

/// Create the household's account, or overwrite its settings if it exists.
pub async fn connect(
    st: &AppState,
    req: ConnectRequest,
    now: OffsetDateTime,
) -> ApiResult<Account> {
    if req.household_id.trim().is_empty() {
        return Err(AppError::validation("household_id is required"));
    }
    if !is_valid_inventory_url(&req.inventory_url) {
        return Err(AppError::validation("inventory_url must be an http(s) URL"));
    }
    check_channel(req.slack_channel.as_deref())?;

    let input = ConnectAccount {
        household_id: req.household_id,
        inventory_url: req.inventory_url,
        slack_channel: req.slack_channel,
        auto_notify: req.auto_notify.unwrap_or(false),
    };
    let account = st.store.upsert_account(&input, now).await?;
    info!(account_id = account.id, household_id = %account.household_id, "account connected");
    Ok(account)
}

pub async fn update_settings(
    st: &AppState,
    id: i64,
    req: UpdateSettingsRequest,
    now: OffsetDateTime,
) -> ApiResult<Account> {
    check_channel(req.slack_channel.as_ref().and_then(|c| c.as_deref()))?;

    let patch = SettingsPatch {
        slack_channel: req.slack_channel,
        auto_notify: req.auto_notify,
    };
    let account = st
        .store
        .update_account_settings(id, &patch, now)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))?;
    info!(account_id = account.id, "account settings updated");
    Ok(account)
}

pub async fn get_by_household(st: &AppState, household_id: &str) -> ApiResult<Option<Account>> {
    Ok(st.store.find_account_by_household(household_id).await?)
}
