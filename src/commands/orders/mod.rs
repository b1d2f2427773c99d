use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Order, SessionUser, Stage},
    services::{sequence::SequenceGenerator, visibility},
    store::OrderStore,
};

pub mod check_delivery_command;
pub mod check_po_command;
pub mod complete_invoice_command;
pub mod complete_logistics_command;
pub mod complete_test_report_command;
pub mod create_order_command;
pub mod plan_dispatch_command;
pub mod receive_material_command;
pub mod record_weighment_command;
pub mod replace_orders_command;
pub mod send_to_dispatch_command;

pub use check_delivery_command::{CheckDeliveryCommand, DeliveryCheckForm};
pub use check_po_command::{CheckPoCommand, PoCheckForm};
pub use complete_invoice_command::{CompleteInvoiceCommand, InvoiceForm};
pub use complete_logistics_command::{CompleteLogisticsCommand, LogisticsForm, RateType};
pub use complete_test_report_command::{CompleteTestReportCommand, TestReportForm};
pub use create_order_command::{CreateOrderCommand, CreateOrderRequest};
pub use plan_dispatch_command::{DispatchPlanForm, PlanDispatchCommand};
pub use receive_material_command::{MaterialReceiptForm, ReceiveMaterialCommand};
pub use record_weighment_command::{RecordWeighmentCommand, WetmanEntryForm};
pub use replace_orders_command::ReplaceOrdersCommand;
pub use send_to_dispatch_command::SendToDispatchCommand;

/// Which order a stage command targets, and as whom.
#[derive(Clone, Debug)]
pub struct StageTarget {
    pub order_id: Uuid,
    pub actor: SessionUser,
    /// Optimistic concurrency check; `None` skips it.
    pub expected_version: Option<u64>,
}

impl StageTarget {
    pub fn new(order_id: Uuid, actor: SessionUser) -> Self {
        Self {
            order_id,
            actor,
            expected_version: None,
        }
    }

    pub fn expecting_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}

/// Everything a stage record builder may look at.
pub(crate) struct StageContext<'a> {
    pub orders: &'a [Order],
    pub sequences: &'a SequenceGenerator,
    pub today: NaiveDate,
}

/// Locates the target order under the store lock and checks visibility and
/// the expected version.
pub(crate) fn locate(orders: &[Order], target: &StageTarget) -> Result<usize, ServiceError> {
    let index = visibility::position_visible(&target.actor, orders, target.order_id)?;
    if let Some(expected) = target.expected_version {
        if orders[index].version != expected {
            return Err(ServiceError::ConcurrentModification(target.order_id));
        }
    }
    Ok(index)
}

/// Shared transition for the eight stage commands.
///
/// Rejects a stage that is already complete (leaving the store untouched) and
/// a stage whose prerequisite is not, then lets `apply` fill in the record.
pub(crate) async fn complete_stage<F>(
    store: &OrderStore,
    event_sender: &EventSender,
    stage: Stage,
    target: &StageTarget,
    apply: F,
) -> Result<Order, ServiceError>
where
    F: FnOnce(&mut Order, &StageContext<'_>) -> Result<(), ServiceError>,
{
    let updated = store
        .mutate(|orders, sequences| {
            let index = locate(orders, target)?;
            let current = &orders[index];

            if current.stage_completed(stage) {
                warn!(order_id = %current.id, %stage, "stage already completed");
                return Err(ServiceError::Conflict(format!(
                    "{} already completed for order {}",
                    stage.title(),
                    current.serial_no
                )));
            }
            if let Some(prerequisite) = stage.prerequisite() {
                if !current.stage_completed(prerequisite) {
                    return Err(ServiceError::InvalidOperation(format!(
                        "{} requires {} to be completed first",
                        stage.title(),
                        prerequisite.title()
                    )));
                }
            }

            let now = Utc::now();
            let mut order = current.clone();
            let context = StageContext {
                orders: orders.as_slice(),
                sequences,
                today: now.date_naive(),
            };
            apply(&mut order, &context)?;
            order.touch(now);

            orders[index] = order.clone();
            Ok(order)
        })
        .await?;

    info!(
        order_id = %updated.id,
        serial_no = %updated.serial_no,
        %stage,
        version = updated.version,
        "stage completed"
    );

    event_sender
        .publish(Event::StageCompleted {
            order_id: updated.id,
            stage,
            version: updated.version,
        })
        .await;

    Ok(updated)
}

/// A stage form as submitted by a client, typed by its stage.
#[derive(Clone, Debug)]
pub enum StageForm {
    PoCheck(PoCheckForm),
    DeliveryCheck(DeliveryCheckForm),
    DispatchPlanning(DispatchPlanForm),
    Logistics(LogisticsForm),
    TestReport(TestReportForm),
    Invoice(InvoiceForm),
    WetmanEntry(WetmanEntryForm),
    MaterialReceipt(MaterialReceiptForm),
}

impl StageForm {
    /// Parses a raw JSON body into the form for `stage`.
    pub fn from_json(stage: Stage, body: serde_json::Value) -> Result<Self, ServiceError> {
        Ok(match stage {
            Stage::PoCheck => StageForm::PoCheck(parse_form(body)?),
            Stage::DeliveryCheck => StageForm::DeliveryCheck(parse_form(body)?),
            Stage::DispatchPlanning => StageForm::DispatchPlanning(parse_form(body)?),
            Stage::Logistics => StageForm::Logistics(parse_form(body)?),
            Stage::TestReport => StageForm::TestReport(parse_form(body)?),
            Stage::Invoice => StageForm::Invoice(parse_form(body)?),
            Stage::WetmanEntry => StageForm::WetmanEntry(parse_form(body)?),
            Stage::MaterialReceipt => StageForm::MaterialReceipt(parse_form(body)?),
        })
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageForm::PoCheck(_) => Stage::PoCheck,
            StageForm::DeliveryCheck(_) => Stage::DeliveryCheck,
            StageForm::DispatchPlanning(_) => Stage::DispatchPlanning,
            StageForm::Logistics(_) => Stage::Logistics,
            StageForm::TestReport(_) => Stage::TestReport,
            StageForm::Invoice(_) => Stage::Invoice,
            StageForm::WetmanEntry(_) => Stage::WetmanEntry,
            StageForm::MaterialReceipt(_) => Stage::MaterialReceipt,
        }
    }
}

fn parse_form<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ServiceError> {
    serde_json::from_value(body).map_err(|e| ServiceError::ValidationError(e.to_string()))
}

/// Treats an empty or whitespace-only string as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    use crate::events::{Event, EventSender};
    use crate::models::{Order, OrderDetails, Role, SessionUser};
    use crate::repositories::InMemoryOrderRepository;
    use crate::services::sequence::SequenceGenerator;
    use crate::store::OrderStore;

    pub fn actor(role: Role, firm: &str) -> SessionUser {
        SessionUser {
            id: format!("{}-{}", role, firm).to_lowercase(),
            role,
            firm: firm.into(),
            name: "Tester".into(),
        }
    }

    pub fn admin(firm: &str) -> SessionUser {
        actor(Role::Admin, firm)
    }

    pub fn details() -> OrderDetails {
        OrderDetails::new(
            "PO-100",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            "27ABCDE1234F1Z5",
            "Acme Refractories",
            dec!(25000),
        )
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub async fn store() -> Arc<OrderStore> {
        Arc::new(
            OrderStore::open(
                Arc::new(InMemoryOrderRepository::new()),
                SequenceGenerator::default(),
            )
            .await
            .unwrap(),
        )
    }

    pub fn events() -> (Arc<EventSender>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(64);
        (Arc::new(EventSender::new(tx)), rx)
    }

    pub async fn seed_order(store: &OrderStore, firm: &str) -> Order {
        let firm = firm.to_string();
        store
            .mutate(move |orders, sequences| {
                let serial = sequences.next(
                    crate::services::sequence::SequenceKind::Serial,
                    &firm,
                    orders,
                );
                let order = Order::new(serial, firm, details(), chrono::Utc::now());
                orders.push(order.clone());
                Ok(order)
            })
            .await
            .unwrap()
    }

    /// Fills fixture records for every stage up to and including `last`.
    pub async fn complete_through(store: &OrderStore, order_id: uuid::Uuid, last: crate::models::Stage) -> Order {
        use crate::models::*;
        use crate::models::Stage as S;

        store
            .mutate(move |orders, _| {
                let order = orders
                    .iter_mut()
                    .find(|o| o.id == order_id)
                    .expect("seeded order");
                let day = date(2024, 1, 10);
                for stage in S::all().into_iter().take_while(|s| *s <= last) {
                    match stage {
                        S::PoCheck => {
                            order.po_check = Some(PoCheckRecord {
                                expected_delivery_date: day,
                                so_checked: false,
                                checked_on: day,
                            })
                        }
                        S::DeliveryCheck => {
                            order.delivery_check = Some(DeliveryCheckRecord {
                                checked_on: day,
                                in_stock_or_not: StockSource::InStock,
                                order_number_production: None,
                                qty_transferred: None,
                                batch_number_remarks: None,
                            })
                        }
                        S::DispatchPlanning => {
                            order.dispatch_planning = Some(DispatchPlanRecord {
                                planned_on: day,
                                ds_number: format!("DS-{}", order.serial_no),
                                date_of_dispatch: day,
                                to_be_reconfirm: None,
                                crm_name: None,
                                crm_id: None,
                            })
                        }
                        S::Logistics => {
                            order.logistics = Some(LogisticsRecord {
                                completed_on: day,
                                lgst_number: format!("LGST-{}", order.serial_no),
                                transporter_name: "Swift Roadways".into(),
                                truck_no: "GJ01AB1234".into(),
                                driver_mobile_no: None,
                                vehicle_no_plate_image: None,
                                bilty_no: Some("BLT-77".into()),
                                rate: FreightRate::FixAmount {
                                    fixed_amount: dec!(4500),
                                },
                            })
                        }
                        S::TestReport => {
                            order.test_report = Some(TestReportRecord {
                                completed_on: day,
                                unique_key: "UK-1".into(),
                                step_key: "SK-1".into(),
                            })
                        }
                        S::Invoice => {
                            order.invoice = Some(InvoiceRecord {
                                invoiced_on: day,
                                quantity_delivered: dec!(10),
                                bill_no: "BILL-1".into(),
                                logistic_no: None,
                                rate_of_material: None,
                                transporter_name: None,
                                vehicle_number: None,
                                bilty_number: None,
                                giving_from_where: None,
                            })
                        }
                        S::WetmanEntry => {
                            order.wetman_entry = Some(WetmanEntryRecord {
                                entered_on: day,
                                actual_qty_loaded_truck: dec!(10),
                                actual_qty_weighment_slip: dec!(9.98),
                                slip_images: Vec::new(),
                                remarks: None,
                            })
                        }
                        S::MaterialReceipt => {
                            order.material_receipt = Some(MaterialReceiptRecord {
                                recorded_on: day,
                                material_received_date: day,
                                grn_number: "GRN-1".into(),
                            })
                        }
                    }
                }
                Ok(order.clone())
            })
            .await
            .unwrap()
    }
}
