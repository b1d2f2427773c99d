use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{dashboard, lifecycle, visibility};
use crate::{
    commands::{
        orders::{
            CheckDeliveryCommand, CheckPoCommand, CompleteInvoiceCommand,
            CompleteLogisticsCommand, CompleteTestReportCommand, CreateOrderCommand,
            CreateOrderRequest, PlanDispatchCommand, ReceiveMaterialCommand,
            RecordWeighmentCommand, ReplaceOrdersCommand, SendToDispatchCommand, StageForm,
            StageTarget,
        },
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{Order, OrderStatus, SessionUser, Stage},
    store::OrderStore,
};

pub use dashboard::{DashboardSummary, StageCount};

/// Order table tabs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderTab {
    /// Material not yet received.
    Open,
    Completed,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    /// Case-insensitive substring matched against every order field
    pub search: Option<String>,
    pub tab: Option<OrderTab>,
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StageQuery {
    pub search: Option<String>,
}

/// An order together with its derived lifecycle position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<Stage>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status: lifecycle::current_status(&order),
            next_stage: lifecycle::next_stage(&order),
            order,
        }
    }
}

/// Pending and history lists for one stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub stage: Stage,
    pub title: String,
    pub pending: Vec<Order>,
    pub history: Vec<Order>,
}

/// True when `term` is empty or occurs (case-insensitively) in any field value.
pub fn matches_search(order: &Order, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    match serde_json::to_value(order) {
        Ok(value) => value_contains(&value, &term),
        Err(_) => false,
    }
}

fn value_contains(value: &serde_json::Value, term: &str) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => b.to_string().contains(term),
        Value::Number(n) => n.to_string().contains(term),
        Value::String(s) => s.to_lowercase().contains(term),
        Value::Array(items) => items.iter().any(|v| value_contains(v, term)),
        Value::Object(map) => map.values().any(|v| value_contains(v, term)),
    }
}

/// Entry point shared by the HTTP handlers and the CLI.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<OrderStore>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(store: Arc<OrderStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    pub fn store(&self) -> &Arc<OrderStore> {
        &self.store
    }

    #[instrument(skip(self, request), fields(actor = %actor.id))]
    pub async fn create_order(
        &self,
        actor: &SessionUser,
        request: CreateOrderRequest,
    ) -> Result<Order, ServiceError> {
        CreateOrderCommand::new(actor.clone(), request)
            .execute(self.store.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, query), fields(actor = %actor.id))]
    pub async fn list_orders(
        &self,
        actor: &SessionUser,
        query: &OrderQuery,
    ) -> Result<Vec<OrderView>, ServiceError> {
        let orders = self.store.read_orders().await;
        let search = query.search.as_deref().unwrap_or_default();

        Ok(visibility::visible(actor, &orders)
            .filter(|order| match query.tab {
                Some(OrderTab::Open) => order.material_receipt.is_none(),
                Some(OrderTab::Completed) => order.material_receipt.is_some(),
                None => true,
            })
            .filter(|order| matches_search(order, search))
            .cloned()
            .map(OrderView::from)
            .collect())
    }

    pub async fn get_order(&self, actor: &SessionUser, id: Uuid) -> Result<OrderView, ServiceError> {
        self.store
            .find(id)
            .await
            .filter(|order| actor.can_view(order))
            .map(OrderView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn read_orders(&self, actor: &SessionUser) -> Vec<Order> {
        let orders = self.store.read_orders().await;
        visibility::visible(actor, &orders).cloned().collect()
    }

    #[instrument(skip(self, orders), fields(actor = %actor.id, count = orders.len()))]
    pub async fn replace_orders(
        &self,
        actor: &SessionUser,
        orders: Vec<Order>,
    ) -> Result<usize, ServiceError> {
        ReplaceOrdersCommand {
            actor: actor.clone(),
            orders,
        }
        .execute(self.store.clone(), self.event_sender.clone())
        .await
    }

    pub async fn stage_view(
        &self,
        actor: &SessionUser,
        stage: Stage,
        search: Option<&str>,
    ) -> StageView {
        let orders = self.store.read_orders().await;
        let search = search.unwrap_or_default();
        let mut pending = Vec::new();
        let mut history = Vec::new();

        for order in visibility::visible(actor, &orders).filter(|o| matches_search(o, search)) {
            if lifecycle::is_history(order, stage) {
                history.push(order.clone());
            } else if lifecycle::is_pending(order, stage) {
                pending.push(order.clone());
            }
        }

        StageView {
            stage,
            title: stage.title().to_string(),
            pending,
            history,
        }
    }

    pub async fn stage_catalogue(&self, actor: &SessionUser) -> Vec<StageCount> {
        let orders = self.store.read_orders().await;
        dashboard::stage_counts(actor, &orders)
    }

    #[instrument(skip(self, form), fields(order_id = %target.order_id, stage = %form.stage()))]
    pub async fn submit_stage(
        &self,
        target: StageTarget,
        form: StageForm,
    ) -> Result<Order, ServiceError> {
        let store = self.store.clone();
        let events = self.event_sender.clone();
        match form {
            StageForm::PoCheck(form) => CheckPoCommand { target, form }.execute(store, events).await,
            StageForm::DeliveryCheck(form) => {
                CheckDeliveryCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::DispatchPlanning(form) => {
                PlanDispatchCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::Logistics(form) => {
                CompleteLogisticsCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::TestReport(form) => {
                CompleteTestReportCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::Invoice(form) => {
                CompleteInvoiceCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::WetmanEntry(form) => {
                RecordWeighmentCommand { target, form }
                    .execute(store, events)
                    .await
            }
            StageForm::MaterialReceipt(form) => {
                ReceiveMaterialCommand { target, form }
                    .execute(store, events)
                    .await
            }
        }
    }

    pub async fn fast_track_to_dispatch(&self, target: StageTarget) -> Result<Order, ServiceError> {
        SendToDispatchCommand::new(target)
            .execute(self.store.clone(), self.event_sender.clone())
            .await
    }

    pub async fn dashboard(&self, actor: &SessionUser) -> DashboardSummary {
        let orders = self.store.read_orders().await;
        dashboard::summarize(actor, &orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::orders::test_support::{
        actor, admin, complete_through, date, events, seed_order, store,
    };
    use crate::commands::orders::PoCheckForm;
    use crate::models::Role;
    use assert_matches::assert_matches;

    async fn service() -> OrderService {
        // Events are best-effort; a closed channel is only logged.
        let (events, _) = events();
        OrderService::new(store().await, events)
    }

    #[tokio::test]
    async fn search_matches_any_field_case_insensitively() {
        let service = service().await;
        let order = seed_order(service.store(), "AAA").await;
        let master = actor(Role::Master, "ALL");

        for term in ["acme", "27abcde", "AAA-001", "25000", ""] {
            let query = OrderQuery {
                search: Some(term.into()),
                tab: None,
            };
            let found = service.list_orders(&master, &query).await.unwrap();
            assert_eq!(found.len(), 1, "term {:?}", term);
            assert_eq!(found[0].order.id, order.id);
        }

        let query = OrderQuery {
            search: Some("no such party".into()),
            tab: None,
        };
        assert!(service.list_orders(&master, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tabs_split_open_and_completed() {
        let service = service().await;
        let open = seed_order(service.store(), "AAA").await;
        let done = seed_order(service.store(), "AAA").await;
        complete_through(service.store(), done.id, Stage::MaterialReceipt).await;
        let user = admin("AAA");

        let open_tab = service
            .list_orders(
                &user,
                &OrderQuery {
                    search: None,
                    tab: Some(OrderTab::Open),
                },
            )
            .await
            .unwrap();
        assert_eq!(open_tab.len(), 1);
        assert_eq!(open_tab[0].order.id, open.id);
        assert_eq!(open_tab[0].status, OrderStatus::Pending);

        let completed = service
            .list_orders(
                &user,
                &OrderQuery {
                    search: None,
                    tab: Some(OrderTab::Completed),
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, OrderStatus::Completed);
        assert_eq!(completed[0].next_stage, None);
    }

    #[tokio::test]
    async fn stage_view_moves_order_after_submission() {
        let service = service().await;
        let order = seed_order(service.store(), "AAA").await;
        let user = admin("AAA");

        let before = service.stage_view(&user, Stage::PoCheck, None).await;
        assert_eq!(before.pending.len(), 1);
        assert!(before.history.is_empty());

        service
            .submit_stage(
                StageTarget::new(order.id, user.clone()),
                StageForm::PoCheck(PoCheckForm {
                    expected_delivery_date: Some(date(2024, 1, 10)),
                }),
            )
            .await
            .unwrap();

        let after = service.stage_view(&user, Stage::PoCheck, None).await;
        assert!(after.pending.is_empty());
        assert_eq!(after.history.len(), 1);
        let delivery = service.stage_view(&user, Stage::DeliveryCheck, None).await;
        assert_eq!(delivery.pending.len(), 1);
    }

    #[tokio::test]
    async fn other_firm_order_is_hidden_everywhere() {
        let service = service().await;
        let order = seed_order(service.store(), "BBB").await;
        let outsider = actor(Role::User, "AAA");

        assert_matches!(
            service.get_order(&outsider, order.id).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(service.read_orders(&outsider).await.is_empty());
        assert_eq!(service.dashboard(&outsider).await.total_orders, 0);
        let view = service.stage_view(&outsider, Stage::PoCheck, None).await;
        assert!(view.pending.is_empty());
    }
}
