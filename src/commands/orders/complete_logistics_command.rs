use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{FreightRate, LogisticsRecord, Order, Stage},
    services::sequence::SequenceKind,
    store::OrderStore,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// The `typeOfRate` choices on the logistics form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RateType {
    #[serde(rename = "Fix Amount")]
    FixAmount,
    #[serde(rename = "Per Matric Ton rate")]
    PerMetricTon,
    #[serde(rename = "Ex Factory Transporter")]
    ExFactoryTransporter,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsForm {
    #[validate(length(min = 1, message = "transporterName is required"))]
    pub transporter_name: Option<String>,
    #[validate(length(min = 1, message = "truckNo is required"))]
    pub truck_no: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_mobile_number")]
    pub driver_mobile_no: Option<String>,
    #[serde(default)]
    pub vehicle_no_plate_image: Option<String>,
    #[serde(default)]
    pub bilty_no: Option<String>,
    pub type_of_rate: Option<RateType>,
    #[serde(default)]
    pub fixed_amount: Option<Decimal>,
    #[serde(default)]
    pub transport_rate_per_ton: Option<Decimal>,
}

impl LogisticsForm {
    /// Pairs the chosen rate type with the amount field it requires.
    pub fn freight_rate(&self) -> Result<FreightRate, ServiceError> {
        let rate_type = self
            .type_of_rate
            .ok_or_else(|| ServiceError::ValidationError("typeOfRate is required".into()))?;

        let (field, amount) = match rate_type {
            RateType::FixAmount => ("fixedAmount", self.fixed_amount),
            RateType::PerMetricTon | RateType::ExFactoryTransporter => {
                ("transportRatePerTon", self.transport_rate_per_ton)
            }
        };
        let amount = match amount {
            Some(amount) if amount > Decimal::ZERO => amount,
            Some(_) => {
                return Err(ServiceError::ValidationError(format!(
                    "{} must be greater than 0",
                    field
                )))
            }
            None => {
                return Err(ServiceError::ValidationError(format!(
                    "{} is required",
                    field
                )))
            }
        };

        Ok(match rate_type {
            RateType::FixAmount => FreightRate::FixAmount {
                fixed_amount: amount,
            },
            RateType::PerMetricTon => FreightRate::PerMetricTon {
                transport_rate_per_ton: amount,
            },
            RateType::ExFactoryTransporter => FreightRate::ExFactoryTransporter {
                transport_rate_per_ton: amount,
            },
        })
    }
}

fn validate_mobile_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let digits = value.chars().all(|c| c.is_ascii_digit());
    if !digits || !(10..=15).contains(&value.len()) {
        let mut err = ValidationError::new("driver_mobile_no");
        err.message = Some("driverMobileNo must be 10 to 15 digits".into());
        return Err(err);
    }
    Ok(())
}

/// Records the transporter and freight terms and issues the LGST number.
#[derive(Clone, Debug)]
pub struct CompleteLogisticsCommand {
    pub target: StageTarget,
    pub form: LogisticsForm,
}

#[async_trait::async_trait]
impl Command for CompleteLogisticsCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let rate = self.form.freight_rate()?;
        let transporter_name = non_blank(&self.form.transporter_name)
            .ok_or_else(|| ServiceError::ValidationError("transporterName is required".into()))?;
        let truck_no = non_blank(&self.form.truck_no)
            .ok_or_else(|| ServiceError::ValidationError("truckNo is required".into()))?;

        complete_stage(
            &store,
            &event_sender,
            Stage::Logistics,
            &self.target,
            |order, ctx| {
                let lgst_number =
                    ctx.sequences
                        .next(SequenceKind::Logistics, &order.firm_name, ctx.orders);
                order.logistics = Some(LogisticsRecord {
                    completed_on: ctx.today,
                    lgst_number,
                    transporter_name,
                    truck_no,
                    driver_mobile_no: non_blank(&self.form.driver_mobile_no),
                    vehicle_no_plate_image: non_blank(&self.form.vehicle_no_plate_image),
                    bilty_no: non_blank(&self.form.bilty_no),
                    rate,
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
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn form() -> LogisticsForm {
        LogisticsForm {
            transporter_name: Some("Swift Roadways".into()),
            truck_no: Some("GJ01AB1234".into()),
            driver_mobile_no: Some("9876543210".into()),
            bilty_no: Some("BLT-9".into()),
            type_of_rate: Some(RateType::PerMetricTon),
            transport_rate_per_ton: Some(dec!(850)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn assigns_lgst_number_for_alias_prefix() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "CCC").await;
        complete_through(&store, order.id, Stage::DispatchPlanning).await;

        let updated = CompleteLogisticsCommand {
            target: StageTarget::new(order.id, admin("CCC")),
            form: form(),
        }
        .execute(store, events)
        .await
        .unwrap();

        let record = updated.logistics.unwrap();
        assert_eq!(record.lgst_number, "LGST-REF-001");
        assert_eq!(
            record.rate,
            FreightRate::PerMetricTon {
                transport_rate_per_ton: dec!(850)
            }
        );
    }

    #[rstest]
    #[case(RateType::FixAmount, None, Some(dec!(10)))]
    #[case(RateType::FixAmount, Some(dec!(0)), None)]
    #[case(RateType::ExFactoryTransporter, Some(dec!(500)), None)]
    fn rate_amount_must_match_type(
        #[case] rate_type: RateType,
        #[case] fixed_amount: Option<Decimal>,
        #[case] per_ton: Option<Decimal>,
    ) {
        let form = LogisticsForm {
            type_of_rate: Some(rate_type),
            fixed_amount,
            transport_rate_per_ton: per_ton,
            ..form()
        };
        assert_matches!(form.freight_rate(), Err(ServiceError::ValidationError(_)));
    }

    #[rstest]
    #[case("98765")]
    #[case("98765-43210")]
    #[case("1234567890123456")]
    fn rejects_bad_mobile_numbers(#[case] number: &str) {
        let form = LogisticsForm {
            driver_mobile_no: Some(number.into()),
            ..form()
        };
        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn requires_dispatch_plan() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "AAA").await;
        complete_through(&store, order.id, Stage::DeliveryCheck).await;

        let result = CompleteLogisticsCommand {
            target: StageTarget::new(order.id, admin("AAA")),
            form: form(),
        }
        .execute(store, events)
        .await;
        assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
    }
}
