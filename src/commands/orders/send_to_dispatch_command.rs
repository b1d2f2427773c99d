use crate::{
    commands::{
        orders::{locate, StageTarget},
        Command,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        DeliveryCheckRecord, DispatchPlanRecord, Order, PoCheckRecord, Stage, StockSource,
    },
    services::sequence::SequenceKind,
    store::OrderStore,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// Sends an order straight to dispatch.
///
/// Any missing PO check (delivery expected today, `soChecked`) and delivery
/// check (in stock) are filled in, then dispatch is planned for today with a
/// fresh DS number, all as a single transition.
#[derive(Clone, Debug)]
pub struct SendToDispatchCommand {
    pub target: StageTarget,
}

impl SendToDispatchCommand {
    pub fn new(target: StageTarget) -> Self {
        Self { target }
    }
}

#[async_trait::async_trait]
impl Command for SendToDispatchCommand {
    type Result = Order;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.target.order_id))]
    async fn execute(
        &self,
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let target = &self.target;
        let updated = store
            .mutate(|orders, sequences| {
                let index = locate(orders, target)?;
                if orders[index].stage_completed(Stage::DispatchPlanning) {
                    return Err(ServiceError::Conflict(format!(
                        "dispatch already planned for order {}",
                        orders[index].serial_no
                    )));
                }

                let now = Utc::now();
                let today = now.date_naive();
                let mut order = orders[index].clone();
                let ds_number = sequences.next(SequenceKind::Dispatch, &order.firm_name, orders);

                if order.po_check.is_none() {
                    order.po_check = Some(PoCheckRecord {
                        expected_delivery_date: today,
                        so_checked: true,
                        checked_on: today,
                    });
                }
                if order.delivery_check.is_none() {
                    order.delivery_check = Some(DeliveryCheckRecord {
                        checked_on: today,
                        in_stock_or_not: StockSource::InStock,
                        order_number_production: None,
                        qty_transferred: None,
                        batch_number_remarks: None,
                    });
                }
                order.dispatch_planning = Some(DispatchPlanRecord {
                    planned_on: today,
                    ds_number,
                    date_of_dispatch: today,
                    to_be_reconfirm: None,
                    crm_name: None,
                    crm_id: None,
                });
                order.touch(now);

                orders[index] = order.clone();
                Ok(order)
            })
            .await?;

        let ds_number = updated.ds_number().unwrap_or_default().to_string();
        info!(
            order_id = %updated.id,
            serial_no = %updated.serial_no,
            %ds_number,
            "Order fast-tracked to dispatch"
        );

        event_sender
            .publish(Event::FastTrackedToDispatch {
                order_id: updated.id,
                ds_number,
            })
            .await;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::orders::test_support::{
        admin, complete_through, events, seed_order, store,
    };
    use crate::services::lifecycle::is_pending;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn fills_missing_stages_in_one_transition() {
        let store = store().await;
        let (events, mut rx) = events();
        let order = seed_order(&store, "BBB").await;

        let updated = SendToDispatchCommand::new(StageTarget::new(order.id, admin("BBB")))
            .execute(store, events)
            .await
            .unwrap();

        assert!(updated.po_check.as_ref().unwrap().so_checked);
        assert_eq!(
            updated.delivery_check.as_ref().unwrap().in_stock_or_not,
            StockSource::InStock
        );
        assert_eq!(updated.ds_number(), Some("DS-BBB-001"));
        assert_eq!(updated.version, 2);
        assert!(is_pending(&updated, Stage::Logistics));
        assert!(matches!(
            rx.recv().await,
            Some(Event::FastTrackedToDispatch { .. })
        ));
    }

    #[tokio::test]
    async fn keeps_existing_po_check() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "BBB").await;
        let checked = complete_through(&store, order.id, Stage::PoCheck).await;

        let updated = SendToDispatchCommand::new(StageTarget::new(order.id, admin("BBB")))
            .execute(store, events)
            .await
            .unwrap();

        assert_eq!(updated.po_check, checked.po_check);
    }

    #[tokio::test]
    async fn already_planned_is_a_conflict() {
        let store = store().await;
        let (events, _rx) = events();
        let order = seed_order(&store, "BBB").await;
        complete_through(&store, order.id, Stage::DispatchPlanning).await;

        let result = SendToDispatchCommand::new(StageTarget::new(order.id, admin("BBB")))
            .execute(store, events)
            .await;
        assert_matches!(result, Err(ServiceError::Conflict(_)));
    }
}
