use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Order, OrderDetails, SessionUser},
    services::{sequence::SequenceKind, visibility},
    store::OrderStore,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body of an order creation request.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Required for master users; others may omit it or repeat their own firm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
    #[serde(flatten)]
    pub details: OrderDetails,
}

#[derive(Clone, Debug)]
pub struct CreateOrderCommand {
    pub actor: SessionUser,
    pub request: CreateOrderRequest,
}

impl CreateOrderCommand {
    pub fn new(actor: SessionUser, request: CreateOrderRequest) -> Self {
        Self { actor, request }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        self.request.details.validate()?;
        for (index, product) in self.request.details.products.iter().enumerate() {
            product.validate().map_err(|e| {
                ServiceError::ValidationError(format!("products[{}]: {}", index, e))
            })?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(actor = %self.actor.id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            error!(error = %e, "invalid order");
            e
        })?;

        let firm = visibility::creation_firm(&self.actor, self.request.firm_name.as_deref())?;

        let mut details = self.request.details.clone();
        for product in details.products.iter_mut() {
            if product.id.trim().is_empty() {
                product.id = Uuid::new_v4().to_string();
            }
        }

        let order = store
            .mutate(move |orders, sequences| {
                let serial_no = sequences.next(SequenceKind::Serial, &firm, orders);
                let order = Order::new(serial_no, firm, details, Utc::now());
                orders.push(order.clone());
                Ok(order)
            })
            .await?;

        info!(
            order_id = %order.id,
            serial_no = %order.serial_no,
            firm = %order.firm_name,
            "Order created successfully"
        );

        event_sender
            .publish(Event::OrderCreated {
                order_id: order.id,
                serial_no: order.serial_no.clone(),
                firm: order.firm_name.clone(),
            })
            .await;

        Ok(order)
    }
}
