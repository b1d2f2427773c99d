use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{MaterialReceiptRecord, Order, Stage},
    store::OrderStore,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialReceiptForm {
    pub material_received_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "grnNumber is required"))]
    pub grn_number: Option<String>,
}

/// Closes the order with the customer's goods receipt note.
#[derive(Clone, Debug)]
pub struct ReceiveMaterialCommand {
    pub target: StageTarget,
    pub form: MaterialReceiptForm,
}

#[async_trait::async_trait]
impl Command for ReceiveMaterialCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let material_received_date = self.form.material_received_date.ok_or_else(|| {
            ServiceError::ValidationError("materialReceivedDate is required".into())
        })?;
        let grn_number = non_blank(&self.form.grn_number)
            .ok_or_else(|| ServiceError::ValidationError("grnNumber is required".into()))?;

        complete_stage(
            &store,
            &event_sender,
            Stage::MaterialReceipt,
            &self.target,
            |order, ctx| {
                order.material_receipt = Some(MaterialReceiptRecord {
                    recorded_on: ctx.today,
                    material_received_date,
                    grn_number,
                });
                Ok(())
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::orders::test_support::{
        admin, complete_through, date, events, seed_order, store,
    };
    use crate::models::OrderStatus;
    use crate::services::lifecycle::current_status;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn completes_the_order() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "AAA").await;
        complete_through(&store, order.id, Stage::WetmanEntry).await;

        let updated = ReceiveMaterialCommand {
            target: StageTarget::new(order.id, admin("AAA")),
            form: MaterialReceiptForm {
                material_received_date: Some(date(2024, 2, 20)),
                grn_number: Some("GRN-5531".into()),
            },
        }
        .execute(store, events)
        .await
        .unwrap();

        assert_eq!(current_status(&updated), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn grn_number_is_required() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "AAA").await;
        complete_through(&store, order.id, Stage::WetmanEntry).await;

        let result = ReceiveMaterialCommand {
            target: StageTarget::new(order.id, admin("AAA")),
            form: MaterialReceiptForm {
                material_received_date: Some(date(2024, 2, 20)),
                grn_number: None,
            },
        }
        .execute(store, events)
        .await;

        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }
}
