//! Authoritative in-memory order collection.
//!
//! The store is the single writer: every change goes through [`OrderStore::mutate`]
//! or [`OrderStore::update_orders`], which persist the full list before
//! publishing it. A failed persist leaves the in-memory list untouched.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::Order;
use crate::repositories::OrderRepository;
use crate::services::sequence::SequenceGenerator;

pub struct OrderStore {
    orders: RwLock<Vec<Order>>,
    repository: Arc<dyn OrderRepository>,
    sequences: SequenceGenerator,
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("sequences", &self.sequences)
            .finish_non_exhaustive()
    }
}

impl OrderStore {
    /// Loads the persisted list. A missing file is an empty list.
    #[instrument(skip_all)]
    pub async fn open(
        repository: Arc<dyn OrderRepository>,
        sequences: SequenceGenerator,
    ) -> Result<Self, ServiceError> {
        let orders = repository.load().await?;
        ensure_unique_keys(&orders)?;
        info!(count = orders.len(), "order store opened");

        Ok(Self {
            orders: RwLock::new(orders),
            repository,
            sequences,
        })
    }

    /// Snapshot of every order.
    pub async fn read_orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn find(&self, id: Uuid) -> Option<Order> {
        self.orders
            .read()
            .await
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Wholesale replace. Duplicate ids and duplicate serial, DS or LGST
    /// numbers are rejected before anything is written.
    #[instrument(skip_all, fields(count = new_orders.len()))]
    pub async fn update_orders(&self, new_orders: Vec<Order>) -> Result<(), ServiceError> {
        ensure_unique_keys(&new_orders)?;

        let mut guard = self.orders.write().await;
        self.repository.save_all(&new_orders).await?;
        *guard = new_orders;
        Ok(())
    }

    /// Applies `change` to a working copy under the write lock, persists the
    /// result and only then publishes it.
    pub async fn mutate<F, R>(&self, change: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<Order>, &SequenceGenerator) -> Result<R, ServiceError>,
    {
        let mut guard = self.orders.write().await;
        let mut working = guard.clone();
        let result = change(&mut working, &self.sequences)?;

        self.repository.save_all(&working).await?;
        *guard = working;
        debug!(count = guard.len(), "order store updated");
        Ok(result)
    }
}

fn ensure_unique_keys(orders: &[Order]) -> Result<(), ServiceError> {
    let mut ids = HashSet::with_capacity(orders.len());
    let mut numbers: HashSet<&str> = HashSet::new();
    for order in orders {
        if !ids.insert(order.id) {
            return Err(ServiceError::Conflict(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        let assigned = [
            Some(order.serial_no.as_str()),
            order.ds_number(),
            order.lgst_number(),
        ];
        for number in assigned.into_iter().flatten() {
            if !numbers.insert(number) {
                return Err(ServiceError::Conflict(format!(
                    "sequence number {} is used by more than one order",
                    number
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchPlanRecord, OrderDetails};
    use crate::repositories::InMemoryOrderRepository;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn order(serial: &str) -> Order {
        let details = OrderDetails::new(
            "PO",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "GST",
            "Party",
            dec!(1),
        );
        Order::new(serial.into(), "AAA".into(), details, Utc::now())
    }

    struct FailingRepository;

    #[async_trait]
    impl OrderRepository for FailingRepository {
        async fn load(&self) -> Result<Vec<Order>, ServiceError> {
            Ok(Vec::new())
        }

        async fn save_all(&self, _orders: &[Order]) -> Result<(), ServiceError> {
            Err(ServiceError::StorageError("disk full".into()))
        }
    }

    #[tokio::test]
    async fn mutate_persists_then_publishes() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let store = OrderStore::open(repo.clone(), SequenceGenerator::default())
            .await
            .unwrap();

        store
            .mutate(|orders, _| {
                orders.push(order("AAA-001"));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(repo.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_persist_leaves_list_unchanged() {
        let store = OrderStore::open(Arc::new(FailingRepository), SequenceGenerator::default())
            .await
            .unwrap();

        let result = store
            .mutate(|orders, _| {
                orders.push(order("AAA-001"));
                Ok(())
            })
            .await;

        assert_matches!(result, Err(ServiceError::StorageError(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_orders_rejects_duplicate_ids() {
        let store = OrderStore::open(
            Arc::new(InMemoryOrderRepository::new()),
            SequenceGenerator::default(),
        )
        .await
        .unwrap();

        let first = order("AAA-001");
        let result = store.update_orders(vec![first.clone(), first]).await;
        assert_matches!(result, Err(ServiceError::Conflict(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_orders_rejects_duplicate_serials() {
        let store = OrderStore::open(
            Arc::new(InMemoryOrderRepository::new()),
            SequenceGenerator::default(),
        )
        .await
        .unwrap();

        let result = store
            .update_orders(vec![order("AAA-001"), order("AAA-001")])
            .await;
        assert_matches!(result, Err(ServiceError::Conflict(msg)) if msg.contains("AAA-001"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_orders_rejects_duplicate_dispatch_numbers() {
        let store = OrderStore::open(
            Arc::new(InMemoryOrderRepository::new()),
            SequenceGenerator::default(),
        )
        .await
        .unwrap();

        let planned = |serial: &str| {
            let mut planned = order(serial);
            planned.dispatch_planning = Some(DispatchPlanRecord {
                planned_on: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                ds_number: "DS-AAA-001".into(),
                date_of_dispatch: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                to_be_reconfirm: None,
                crm_name: None,
                crm_id: None,
            });
            planned
        };

        let result = store
            .update_orders(vec![planned("AAA-001"), planned("AAA-002")])
            .await;
        assert_matches!(result, Err(ServiceError::Conflict(msg)) if msg.contains("DS-AAA-001"));
        assert!(store.is_empty().await);
    }
}
