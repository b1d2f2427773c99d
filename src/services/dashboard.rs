//! Dashboard statistics over the orders an actor can see.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{lifecycle, visibility};
use crate::models::{Order, OrderStatus, SessionUser, Stage};

const RECENT_ORDER_COUNT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirmSummary {
    pub firm: String,
    pub orders: usize,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage: Stage,
    pub title: String,
    pub pending: usize,
    pub history: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: Uuid,
    pub serial_no: String,
    pub firm_name: String,
    pub party_name: String,
    pub total_po_value: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_orders: usize,
    /// Orders still waiting for their PO check.
    pub pending_orders: usize,
    /// Orders whose material has been received.
    pub completed_orders: usize,
    pub in_progress_orders: usize,
    pub total_value: Decimal,
    pub firms: Vec<FirmSummary>,
    pub stages: Vec<StageCount>,
    /// Most recently created orders, newest first.
    pub recent_orders: Vec<RecentOrder>,
}

/// Per-stage pending/history counts for the actor.
pub fn stage_counts(actor: &SessionUser, orders: &[Order]) -> Vec<StageCount> {
    Stage::all()
        .into_iter()
        .map(|stage| {
            let (pending, history) =
                visibility::visible(actor, orders).fold((0, 0), |(p, h), order| {
                    (
                        p + usize::from(lifecycle::is_pending(order, stage)),
                        h + usize::from(lifecycle::is_history(order, stage)),
                    )
                });
            StageCount {
                stage,
                title: stage.title().to_string(),
                pending,
                history,
            }
        })
        .collect()
}

pub fn summarize(actor: &SessionUser, orders: &[Order]) -> DashboardSummary {
    let visible: Vec<&Order> = visibility::visible(actor, orders).collect();

    let total_orders = visible.len();
    let pending_orders = visible.iter().filter(|o| o.po_check.is_none()).count();
    let completed_orders = visible
        .iter()
        .filter(|o| o.material_receipt.is_some())
        .count();
    let in_progress_orders = total_orders.saturating_sub(pending_orders + completed_orders);
    let total_value: Decimal = visible.iter().map(|o| o.details.total_po_value).sum();

    let mut by_firm: BTreeMap<String, FirmSummary> = BTreeMap::new();
    if !actor.is_master() {
        by_firm.insert(
            actor.firm.clone(),
            FirmSummary {
                firm: actor.firm.clone(),
                orders: 0,
                revenue: Decimal::ZERO,
            },
        );
    }
    for order in &visible {
        let entry = by_firm
            .entry(order.firm_name.clone())
            .or_insert_with(|| FirmSummary {
                firm: order.firm_name.clone(),
                orders: 0,
                revenue: Decimal::ZERO,
            });
        entry.orders += 1;
        entry.revenue += order.details.total_po_value;
    }

    let recent_orders = visible
        .iter()
        .rev()
        .take(RECENT_ORDER_COUNT)
        .map(|order| RecentOrder {
            id: order.id,
            serial_no: order.serial_no.clone(),
            firm_name: order.firm_name.clone(),
            party_name: order.details.party_name.clone(),
            total_po_value: order.details.total_po_value,
            status: lifecycle::current_status(order),
            created_at: order.created_at,
        })
        .collect();

    DashboardSummary {
        total_orders,
        pending_orders,
        completed_orders,
        in_progress_orders,
        total_value,
        firms: by_firm.into_values().collect(),
        stages: stage_counts(actor, orders),
        recent_orders,
    }
}
