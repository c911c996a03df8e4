use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::ShopApi;
use crate::error::Result;
use crate::types::Order;

use super::RequestStatus;

/// Orders seen by this client, keyed by order id.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct OrderSlice {
    orders: BTreeMap<String, Order>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl OrderSlice {
    pub fn upsert(&mut self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn replace_all(&mut self, orders: Vec<Order>) {
        self.orders = orders.into_iter().map(|o| (o.id.clone(), o)).collect();
    }
}

pub async fn fetch_mine<A: ShopApi>(api: &A, orders: &mut OrderSlice) -> Result<()> {
    orders.status = RequestStatus::Loading;
    let mine = orders.status.settle(api.my_orders().await)?;
    orders.replace_all(mine);
    Ok(())
}

/// Refresh a single order from the server and cache it.
pub async fn fetch_one<A: ShopApi>(api: &A, orders: &mut OrderSlice, id: &str) -> Result<Order> {
    orders.status = RequestStatus::Loading;
    let order = orders.status.settle(api.order(id).await)?;
    orders.upsert(order.clone());
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_order, FakeApi};

    #[test]
    fn test_list_newest_first() {
        let mut slice = OrderSlice::default();
        let mut older = sample_order("o1", false);
        older.created_at = "2026-01-01T10:00:00Z".to_string();
        let mut newer = sample_order("o2", true);
        newer.created_at = "2026-02-01T10:00:00Z".to_string();
        slice.upsert(older);
        slice.upsert(newer);

        let ids: Vec<&str> = slice.list().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o2", "o1"]);
    }

    #[test]
    fn test_upsert_replaces_cached_copy() {
        let mut slice = OrderSlice::default();
        slice.upsert(sample_order("o1", false));
        slice.upsert(sample_order("o1", true));
        assert_eq!(slice.list().len(), 1);
        assert!(slice.get("o1").unwrap().is_paid);
    }

    #[tokio::test]
    async fn test_fetch_one_failure_keeps_cache() {
        let api = FakeApi::new();
        let mut slice = OrderSlice::default();
        slice.upsert(sample_order("o1", false));

        assert!(fetch_one(&api, &mut slice, "missing").await.is_err());
        assert!(slice.get("o1").is_some());
        assert!(slice.status.is_failed());
    }

    #[tokio::test]
    async fn test_fetch_mine_replaces_cache() {
        let api = FakeApi::new();
        api.add_order(sample_order("o7", true));
        let mut slice = OrderSlice::default();
        slice.upsert(sample_order("stale", false));

        fetch_mine(&api, &mut slice).await.unwrap();

        assert!(slice.get("stale").is_none());
        assert!(slice.get("o7").is_some());
    }
}
