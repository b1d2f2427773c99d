use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{InvoiceRecord, Order, Stage},
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
pub struct InvoiceForm {
    #[validate(custom = "validate_positive_quantity")]
    pub quantity_delivered: Option<Decimal>,
    #[validate(length(min = 1, message = "billNo is required"))]
    pub bill_no: Option<String>,
    #[serde(default)]
    pub logistic_no: Option<String>,
    #[serde(default)]
    pub rate_of_material: Option<Decimal>,
    /// Defaults to the logistics transporter.
    #[serde(default)]
    pub transporter_name: Option<String>,
    /// Defaults to the logistics truck number.
    #[serde(default)]
    pub vehicle_number: Option<String>,
    /// Defaults to the logistics bilty number.
    #[serde(default)]
    pub bilty_number: Option<String>,
    #[serde(default)]
    pub giving_from_where: Option<String>,
}

fn validate_positive_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("quantity_delivered");
        err.message = Some("quantityDelivered must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct CompleteInvoiceCommand {
    pub target: StageTarget,
    pub form: InvoiceForm,
}

#[async_trait::async_trait]
impl Command for CompleteInvoiceCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let quantity_delivered = self.form.quantity_delivered.ok_or_else(|| {
            ServiceError::ValidationError("quantityDelivered is required".into())
        })?;
        let bill_no = non_blank(&self.form.bill_no)
            .ok_or_else(|| ServiceError::ValidationError("billNo is required".into()))?;

        complete_stage(
            &store,
            &event_sender,
            Stage::Invoice,
            &self.target,
            |order, ctx| {
                let logistics = order.logistics.as_ref();
                let transporter_name = non_blank(&self.form.transporter_name)
                    .or_else(|| logistics.map(|l| l.transporter_name.clone()));
                let vehicle_number = non_blank(&self.form.vehicle_number)
                    .or_else(|| logistics.map(|l| l.truck_no.clone()));
                let bilty_number = non_blank(&self.form.bilty_number)
                    .or_else(|| logistics.and_then(|l| l.bilty_no.clone()));

                order.invoice = Some(InvoiceRecord {
                    invoiced_on: ctx.today,
                    quantity_delivered,
                    bill_no,
                    logistic_no: non_blank(&self.form.logistic_no),
                    rate_of_material: self.form.rate_of_material,
                    transporter_name,
                    vehicle_number,
                    bilty_number,
                    giving_from_where: non_blank(&self.form.giving_from_where),
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
    use crate::commands::orders::test_support::{admin, complete_through, events, seed_order, store};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn transport_fields_default_from_logistics() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "AAA").await;
        complete_through(&store, order.id, Stage::TestReport).await;

        let updated = CompleteInvoiceCommand {
            target: StageTarget::new(order.id, admin("AAA")),
            form: InvoiceForm {
                quantity_delivered: Some(dec!(9.5)),
                bill_no: Some("INV-204".into()),
                vehicle_number: Some("GJ05ZZ0001".into()),
                ..Default::default()
            },
        }
        .execute(store, events)
        .await
        .unwrap();

        let invoice = updated.invoice.unwrap();
        assert_eq!(invoice.transporter_name.as_deref(), Some("Swift Roadways"));
        assert_eq!(invoice.vehicle_number.as_deref(), Some("GJ05ZZ0001"));
        assert_eq!(invoice.bilty_number.as_deref(), Some("BLT-77"));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let form = InvoiceForm {
            quantity_delivered: Some(dec!(0)),
            bill_no: Some("INV-1".into()),
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn requires_test_report() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "AAA").await;
        complete_through(&store, order.id, Stage::Logistics).await;

        let result = CompleteInvoiceCommand {
            target: StageTarget::new(order.id, admin("AAA")),
            form: InvoiceForm {
                quantity_delivered: Some(dec!(1)),
                bill_no: Some("INV-1".into()),
                ..Default::default()
            },
        }
        .execute(store, events)
        .await;
        assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
    }
}
