use crate::{
    commands::{
        orders::{complete_stage, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{Order, PoCheckRecord, Stage},
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
pub struct PoCheckForm {
    pub expected_delivery_date: Option<NaiveDate>,
}

/// Confirms the purchase order and records the promised delivery date.
#[derive(Clone, Debug)]
pub struct CheckPoCommand {
    pub target: StageTarget,
    pub form: PoCheckForm,
}

#[async_trait::async_trait]
impl Command for CheckPoCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let expected_delivery_date = self
            .form
            .expected_delivery_date
            .ok_or_else(|| ServiceError::ValidationError("expectedDeliveryDate is required".into()))?;

        complete_stage(&store, &event_sender, Stage::PoCheck, &self.target, |order, ctx| {
            order.po_check = Some(PoCheckRecord {
                expected_delivery_date,
                so_checked: false,
                checked_on: ctx.today,
            });
            Ok(())
        })
        .await
    }
}
