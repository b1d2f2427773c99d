use crate::{errors::ServiceError, events::EventSender, store::OrderStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// A command carries everything one business operation needs (the acting user
/// included), validates itself, applies one guarded transition to the order
/// store and publishes the resulting domain event.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `store` - Order store owning the authoritative order list
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod orders;
