use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{JsonStore, OrderRepository};
use crate::errors::ServiceError;
use crate::models::Order;

/// Storage key of the order list.
pub const ORDERS_KEY: &str = "orders";

/// Orders persisted as a JSON array under the `orders` key.
#[derive(Clone, Debug)]
pub struct JsonOrderRepository {
    store: JsonStore,
}

impl JsonOrderRepository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrderRepository for JsonOrderRepository {
    async fn load(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.read(ORDERS_KEY).await?.unwrap_or_default())
    }

    async fn save_all(&self, orders: &[Order]) -> Result<(), ServiceError> {
        self.store.write(ORDERS_KEY, orders).await
    }
}

/// Volatile repository used by tests and the `in-memory` backend.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn load(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.lock().await.clone())
    }

    async fn save_all(&self, orders: &[Order]) -> Result<(), ServiceError> {
        *self.orders.lock().await = orders.to_vec();
        Ok(())
    }
}
