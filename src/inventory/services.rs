use time::OffsetDateTime;
use tracing::info;

use crate::{
    dates::is_expiring_soon,
    db::{InventoryItem, NewInventoryItem},
    error::{ApiResult, AppError},
    state::AppState,
};

/// Re-derives the expiry flag of stored rows against `now`.
fn with_flags(items: Vec<InventoryItem>, now: OffsetDateTime) -> Vec<InventoryItem> {
    items
        .into_iter()
        .map(|mut item| {
            item.is_expiring_soon = is_expiring_soon(item.expiry_date, now);
            item
        })
        .collect()
}

/// Pull the household's inventory from its source and replace the local copy.
pub async fn refresh(
    st: &AppState,
    account_id: i64,
    now: OffsetDateTime,
) -> ApiResult<Vec<InventoryItem>> {
    let account = st
        .store
        .find_account(account_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

    let fetched = st
        .inventory
        .fetch(&account.inventory_url, &account.household_id)
        .await?
        .into_items()?;

    let items: Vec<NewInventoryItem> = fetched
        .into_iter()
        .map(|i| NewInventoryItem {
            is_expiring_soon: is_expiring_soon(i.expiry_date, now),
            name: i.name,
            quantity: i.quantity,
            unit: i.unit,
            expiry_date: i.expiry_date,
        })
        .collect();
    st.store.replace_inventory(account.id, &items, now).await?;

    let stored = with_flags(st.store.list_inventory(account.id).await?, now);
    info!(
        account_id = account.id,
        household_id = %account.household_id,
        items = stored.len(),
        expiring = stored.iter().filter(|i| i.is_expiring_soon).count(),
        "inventory refreshed"
    );
    Ok(stored)
}

pub async fn list(
    st: &AppState,
    account_id: i64,
    now: OffsetDateTime,
) -> ApiResult<Vec<InventoryItem>> {
    Ok(with_flags(st.store.list_inventory(account_id).await?, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use crate::upstream::{InventoryPayload, SourceItem, UpstreamError};
    use time::macros::{date, datetime};
    use time::Date;

    fn item(name: &str, expiry: Option<Date>) -> SourceItem {
        SourceItem {
            name: name.into(),
            quantity: 1,
            unit: "pcs".into(),
            expiry_date: expiry,
        }
    }

    #[tokio::test]
    async fn refresh_flags_items_and_passes_household_header() {
        let h = Harness::new();
        let acc = h.account("hh-1", None, false).await;
        h.inventory.push(Ok(InventoryPayload::success(vec![
            item("Milk", Some(date!(2024 - 12 - 22))),
            item("Flour", None),
            item("Cheese", Some(date!(2024 - 12 - 30))),
        ])));

        let now = datetime!(2024-12-20 12:00 UTC);
        let items = refresh(&h.state, acc.id, now).await.unwrap();

        let names: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.is_expiring_soon)).collect();
        assert_eq!(names, vec![("Milk", true), ("Cheese", false), ("Flour", false)]);

        let calls = h.inventory.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(acc.inventory_url.clone(), "hh-1".to_string())]);
    }

    #[tokio::test]
    async fn second_refresh_replaces_the_whole_set() {
        let h = Harness::new();
        let acc = h.account("hh-2", None, false).await;
        h.inventory
            .push(Ok(InventoryPayload::success(vec![item("Apples", None), item("Bread", None)])));
        h.inventory
            .push(Ok(InventoryPayload::success(vec![item("Carrots", None)])));

        let now = OffsetDateTime::now_utc();
        refresh(&h.state, acc.id, now).await.unwrap();
        let items = refresh(&h.state, acc.id, now).await.unwrap();

        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Carrots"]);
        assert_eq!(list(&h.state, acc.id, now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refresh_unknown_account_is_not_found() {
        let h = Harness::new();
        let err = refresh(&h.state, 99, OffsetDateTime::now_utc()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.inventory.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_leave_inventory_untouched() {
        let h = Harness::new();
        let acc = h.account("hh-3", None, false).await;
        h.inventory
            .push(Ok(InventoryPayload::success(vec![item("Rice", None)])));
        h.inventory.push(Ok(InventoryPayload {
            status: "error".into(),
            items: vec![],
        }));
        h.inventory.push(Err(UpstreamError::Status {
            service: "inventory source",
            status: 503,
        }));

        let now = OffsetDateTime::now_utc();
        refresh(&h.state, acc.id, now).await.unwrap();

        let err = refresh(&h.state, acc.id, now).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(UpstreamError::Rejected { .. })));
        let err = refresh(&h.state, acc.id, now).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(UpstreamError::Status { status: 503, .. })));

        let left = list(&h.state, acc.id, now).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Rice");
    }

    #[tokio::test]
    async fn list_orders_dated_first_then_by_name_and_recomputes_flag() {
        let h = Harness::new();
        let acc = h.account("hh-4", None, false).await;
        h.inventory.push(Ok(InventoryPayload::success(vec![
            item("Yogurt", None),
            item("Beans", None),
            item("Ham", Some(date!(2024 - 12 - 25))),
            item("Eggs", Some(date!(2024 - 12 - 21))),
            item("Apple", Some(date!(2024 - 12 - 25))),
        ])));
        refresh(&h.state, acc.id, datetime!(2024-12-01 00:00 UTC))
            .await
            .unwrap();

        let later = datetime!(2024-12-22 09:00 UTC);
        let items = list(&h.state, acc.id, later).await.unwrap();
        let view: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.is_expiring_soon)).collect();
        assert_eq!(
            view,
            vec![
                ("Eggs", true),
                ("Apple", true),
                ("Ham", true),
                ("Beans", false),
                ("Yogurt", false),
            ]
        );
    }
}
