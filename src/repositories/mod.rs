use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::models::Order;

pub mod json_store;
pub mod order_repository;
pub mod session_repository;

pub use json_store::JsonStore;
pub use order_repository::{InMemoryOrderRepository, JsonOrderRepository};
pub use session_repository::CurrentUserRepository;

/// Persistence seam for the order collection.
///
/// The whole list is loaded and saved at once; the order store is the only
/// caller and serialises writers itself.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads every persisted order. Missing storage is an empty list.
    async fn load(&self) -> Result<Vec<Order>, ServiceError>;

    /// Replaces the persisted list with `orders`.
    async fn save_all(&self, orders: &[Order]) -> Result<(), ServiceError>;
}
