use crate::{
    commands::{
        orders::{complete_stage, non_blank, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{DispatchPlanRecord, Order, Stage},
    services::sequence::SequenceKind,
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
pub struct DispatchPlanForm {
    pub date_of_dispatch: Option<NaiveDate>,
    #[serde(default)]
    pub to_be_reconfirm: Option<String>,
    #[serde(default)]
    pub crm_name: Option<String>,
    #[serde(default)]
    pub crm_id: Option<String>,
}

/// Schedules dispatch and issues the order's DS number.
#[derive(Clone, Debug)]
pub struct PlanDispatchCommand {
    pub target: StageTarget,
    pub form: DispatchPlanForm,
}

#[async_trait::async_trait]
impl Command for PlanDispatchCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let date_of_dispatch = self
            .form
            .date_of_dispatch
            .ok_or_else(|| ServiceError::ValidationError("dateOfDispatch is required".into()))?;

        complete_stage(
            &store,
            &event_sender,
            Stage::DispatchPlanning,
            &self.target,
            |order, ctx| {
                let ds_number =
                    ctx.sequences
                        .next(SequenceKind::Dispatch, &order.firm_name, ctx.orders);
                order.dispatch_planning = Some(DispatchPlanRecord {
                    planned_on: ctx.today,
                    ds_number,
                    date_of_dispatch,
                    to_be_reconfirm: non_blank(&self.form.to_be_reconfirm),
                    crm_name: non_blank(&self.form.crm_name),
                    crm_id: non_blank(&self.form.crm_id),
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
    use assert_matches::assert_matches;

    fn form() -> DispatchPlanForm {
        DispatchPlanForm {
            date_of_dispatch: Some(date(2024, 1, 15)),
            crm_name: Some("Ravi".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ds_numbers_follow_firm_sequence() {
        let store = store().await;
        let (events, _rx) = events();
        let first = seed_order(&store, "DDD").await;
        let second = seed_order(&store, "DDD").await;
        complete_through(&store, first.id, Stage::DeliveryCheck).await;
        complete_through(&store, second.id, Stage::DeliveryCheck).await;

        let a = PlanDispatchCommand {
            target: StageTarget::new(second.id, admin("DDD")),
            form: form(),
        }
        .execute(store.clone(), events.clone())
        .await
        .unwrap();
        let b = PlanDispatchCommand {
            target: StageTarget::new(first.id, admin("DDD")),
            form: form(),
        }
        .execute(store, events)
        .await
        .unwrap();

        assert_eq!(a.ds_number(), Some("DS-DDD-001"));
        assert_eq!(b.ds_number(), Some("DS-DDD-002"));
        assert_eq!(b.dispatch_planning.unwrap().crm_name.as_deref(), Some("Ravi"));
    }

    #[tokio::test]
    async fn requires_delivery_check() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "DDD").await;
        complete_through(&store, order.id, Stage::PoCheck).await;

        let result = PlanDispatchCommand {
            target: StageTarget::new(order.id, admin("DDD")),
            form: form(),
        }
        .execute(store, events)
        .await;

        assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
    }
}
