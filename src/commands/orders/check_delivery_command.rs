use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{DeliveryCheckRecord, Order, Stage, StockSource},
    store::OrderStore,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCheckForm {
    pub in_stock_or_not: Option<StockSource>,
    /// Production order number; in-stock deliveries only.
    #[serde(default)]
    pub order_number_production: Option<String>,
    #[serde(default)]
    pub qty_transferred: Option<Decimal>,
    #[serde(default)]
    pub batch_number_remarks: Option<String>,
}

impl DeliveryCheckForm {
    /// Production details only make sense for goods already in stock.
    fn check(&self, source: StockSource) -> Result<(), ServiceError> {
        let has_production_fields = non_blank(&self.order_number_production).is_some()
            || non_blank(&self.batch_number_remarks).is_some()
            || self.qty_transferred.is_some();

        if source != StockSource::InStock && has_production_fields {
            return Err(ServiceError::ValidationError(format!(
                "production details are only accepted for \"{}\" deliveries",
                StockSource::InStock
            )));
        }
        if matches!(self.qty_transferred, Some(qty) if qty < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "qtyTransferred must not be negative".into(),
            ));
        }
        Ok(())
    }

    fn record(&self, source: StockSource, checked_on: NaiveDate) -> DeliveryCheckRecord {
        DeliveryCheckRecord {
            checked_on,
            in_stock_or_not: source,
            order_number_production: non_blank(&self.order_number_production),
            qty_transferred: self.qty_transferred,
            batch_number_remarks: non_blank(&self.batch_number_remarks),
        }
    }
}

/// Records where the goods for the order will come from.
#[derive(Clone, Debug)]
pub struct CheckDeliveryCommand {
    pub target: StageTarget,
    pub form: DeliveryCheckForm,
}

#[async_trait::async_trait]
impl Command for CheckDeliveryCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let source = self
            .form
            .in_stock_or_not
            .ok_or_else(|| ServiceError::ValidationError("inStockOrNot is required".into()))?;
        self.form.check(source)?;

        complete_stage(
            &store,
            &event_sender,
            Stage::DeliveryCheck,
            &self.target,
            |order, ctx| {
                order.delivery_check = Some(self.form.record(source, ctx.today));
                Ok(())
            },
        )
        .await
    }
}
