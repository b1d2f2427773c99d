use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Order, SessionUser},
    store::OrderStore,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Replaces the whole order list. Reserved for master users.
#[derive(Clone, Debug)]
pub struct ReplaceOrdersCommand {
    pub actor: SessionUser,
    pub orders: Vec<Order>,
}

#[async_trait::async_trait]
impl Command for ReplaceOrdersCommand {
    type Result = usize;

    #[instrument(skip(self, store, event_sender), fields(actor = %self.actor.id, count = self.orders.len()))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if !self.actor.is_master() {
            warn!("non-master attempted to replace the order list");
            return Err(ServiceError::Forbidden(
                "only master users may replace the order list".into(),
            ));
        }

        let count = self.orders.len();
        store.update_orders(self.orders.clone()).await?;
        info!(count, "Order list replaced");

        event_sender.publish(Event::OrdersReplaced { count }).await;
        Ok(count)
    }
}
