use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{Order, Stage, WetmanEntryRecord},
    store::OrderStore,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WetmanEntryForm {
    #[validate(custom = "validate_quantity")]
    pub actual_qty_loaded_truck: Option<Decimal>,
    #[validate(custom = "validate_quantity")]
    pub actual_qty_weighment_slip: Option<Decimal>,
    /// References to uploaded weighment slips.
    #[serde(default)]
    #[validate(length(max = 3, message = "at most 3 slip images"))]
    pub slip_images: Vec<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("quantity");
        err.message = Some("quantities must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Records the weighment slip against the loaded quantity.
#[derive(Clone, Debug)]
pub struct RecordWeighmentCommand {
    pub target: StageTarget,
    pub form: WetmanEntryForm,
}

#[async_trait::async_trait]
impl Command for RecordWeighmentCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let (Some(loaded), Some(weighed)) = (
            self.form.actual_qty_loaded_truck,
            self.form.actual_qty_weighment_slip,
        ) else {
            return Err(ServiceError::ValidationError(
                "actualQtyLoadedTruck and actualQtyWeighmentSlip are required".into(),
            ));
        };
        let slip_images: Vec<String> = self
            .form
            .slip_images
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        complete_stage(
            &store,
            &event_sender,
            Stage::WetmanEntry,
            &self.target,
            |order, ctx| {
                order.wetman_entry = Some(WetmanEntryRecord {
                    entered_on: ctx.today,
                    actual_qty_loaded_truck: loaded,
                    actual_qty_weighment_slip: weighed,
                    slip_images,
                    remarks: non_blank(&self.form.remarks),
                });
                Ok(())
            },
        )
        .await
    }
}
