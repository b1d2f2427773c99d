//! Stage gating: which orders are waiting on a stage and which have passed it.

use crate::models::{Order, OrderStatus, Stage};

/// An order is pending for `stage` when its prerequisite is complete and the
/// stage itself is not.
pub fn is_pending(order: &Order, stage: Stage) -> bool {
    let ready = stage
        .prerequisite()
        .map_or(true, |prerequisite| order.stage_completed(prerequisite));
    ready && !order.stage_completed(stage)
}

pub fn is_history(order: &Order, stage: Stage) -> bool {
    order.stage_completed(stage)
}

/// First stage the order has not completed yet.
pub fn next_stage(order: &Order) -> Option<Stage> {
    Stage::all()
        .into_iter()
        .find(|stage| !order.stage_completed(*stage))
}

pub fn current_status(order: &Order) -> OrderStatus {
    if order.material_receipt.is_some() {
        OrderStatus::Completed
    } else if order.invoice.is_some() {
        OrderStatus::Invoiced
    } else if order.logistics.is_some() {
        OrderStatus::InTransit
    } else if order.dispatch_planning.is_some() {
        OrderStatus::Dispatched
    } else if order.po_check.is_some() {
        OrderStatus::Processing
    } else {
        OrderStatus::Pending
    }
}
