use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::stage::{Stage, StockSource, TransportingType};

/// Display status of an order, derived from its most advanced stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
pub enum OrderStatus {
    Pending,
    Processing,
    Dispatched,
    #[serde(rename = "In Transit")]
    #[strum(serialize = "In Transit")]
    InTransit,
    Invoiced,
    Completed,
}

/// A product line on the purchase order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, message = "productName is required"))]
    pub product_name: String,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_po_basic_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alumina_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iron_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<String>,
}

/// Purchase-order details captured when the order is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// Customer purchase order number.
    #[validate(length(min = 1, message = "partyPoNumber is required"))]
    pub party_po_number: String,

    /// Date printed on the customer purchase order.
    pub party_po_date: NaiveDate,

    #[validate(length(min = 1, message = "gstNumber is required"))]
    pub gst_number: String,

    #[validate(length(min = 1, message = "partyName is required"))]
    pub party_name: String,

    /// Total purchase order value.
    #[validate(custom = "validate_non_negative")]
    pub total_po_value: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_transporting: Option<TransportingType>,
    /// Reference to the uploaded PO copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_po_copy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_to_be_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_received_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_payment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_percentage")]
    pub retention_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_retention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_concern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_pi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_sales_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc_required: Option<String>,

    #[serde(default)]
    pub products: Vec<Product>,
}

impl OrderDetails {
    /// Minimal details, mostly useful for tests and fixtures.
    pub fn new(
        party_po_number: impl Into<String>,
        party_po_date: NaiveDate,
        gst_number: impl Into<String>,
        party_name: impl Into<String>,
        total_po_value: Decimal,
    ) -> Self {
        Self {
            party_po_number: party_po_number.into(),
            party_po_date,
            gst_number: gst_number.into(),
            party_name: party_name.into(),
            total_po_value,
            address: None,
            type_of_transporting: None,
            party_po_copy: None,
            free_replacement: None,
            reference_no: None,
            payment_to_be_taken: None,
            order_received_form: None,
            contact_person_name: None,
            contact_person_whatsapp: None,
            lead_time_collection: None,
            type_of_application: None,
            retention_payment: None,
            retention_percentage: None,
            lead_time_retention: None,
            specific_concern: None,
            customer_category: None,
            agent: None,
            type_of_pi: None,
            marketing_sales_person: None,
            tc_required: None,
            products: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoCheckRecord {
    pub expected_delivery_date: NaiveDate,
    /// Only set by a fast-track to dispatch.
    #[serde(default)]
    pub so_checked: bool,
    pub checked_on: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCheckRecord {
    pub checked_on: NaiveDate,
    pub in_stock_or_not: StockSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number_production: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_transferred: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number_remarks: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPlanRecord {
    pub planned_on: NaiveDate,
    pub ds_number: String,
    pub date_of_dispatch: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_be_reconfirm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_id: Option<String>,
}

/// How freight is charged. Serialized with a `typeOfRate` tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "typeOfRate")]
pub enum FreightRate {
    #[serde(rename = "Fix Amount")]
    FixAmount {
        #[serde(rename = "fixedAmount")]
        fixed_amount: Decimal,
    },
    #[serde(rename = "Per Matric Ton rate")]
    PerMetricTon {
        #[serde(rename = "transportRatePerTon")]
        transport_rate_per_ton: Decimal,
    },
    #[serde(rename = "Ex Factory Transporter")]
    ExFactoryTransporter {
        #[serde(rename = "transportRatePerTon")]
        transport_rate_per_ton: Decimal,
    },
}

impl FreightRate {
    pub fn amount(&self) -> Decimal {
        match self {
            FreightRate::FixAmount { fixed_amount } => *fixed_amount,
            FreightRate::PerMetricTon {
                transport_rate_per_ton,
            }
            | FreightRate::ExFactoryTransporter {
                transport_rate_per_ton,
            } => *transport_rate_per_ton,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsRecord {
    pub completed_on: NaiveDate,
    pub lgst_number: String,
    pub transporter_name: String,
    pub truck_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_mobile_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_no_plate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilty_no: Option<String>,
    #[serde(flatten)]
    pub rate: FreightRate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestReportRecord {
    pub completed_on: NaiveDate,
    pub unique_key: String,
    pub step_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub invoiced_on: NaiveDate,
    pub quantity_delivered: Decimal,
    pub bill_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistic_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_of_material: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transporter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bilty_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giving_from_where: Option<String>,
}

/// Weighment-slip entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WetmanEntryRecord {
    pub entered_on: NaiveDate,
    pub actual_qty_loaded_truck: Decimal,
    pub actual_qty_weighment_slip: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slip_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialReceiptRecord {
    pub recorded_on: NaiveDate,
    pub material_received_date: NaiveDate,
    pub grn_number: String,
}

/// One purchase-order-to-delivery workflow instance.
///
/// Stage records only ever accrete: a stage is complete exactly when its
/// record is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    /// Firm-scoped display number, e.g. `AAA-001`.
    pub serial_no: String,
    pub firm_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every transition; used for optimistic concurrency.
    pub version: u64,

    #[serde(flatten)]
    pub details: OrderDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_check: Option<PoCheckRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_check: Option<DeliveryCheckRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_planning: Option<DispatchPlanRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistics: Option<LogisticsRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_report: Option<TestReportRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wetman_entry: Option<WetmanEntryRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_receipt: Option<MaterialReceiptRecord>,
}

impl Order {
    pub fn new(
        serial_no: String,
        firm_name: String,
        details: OrderDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            serial_no,
            firm_name,
            created_at: now,
            updated_at: now,
            version: 1,
            details,
            po_check: None,
            delivery_check: None,
            dispatch_planning: None,
            logistics: None,
            test_report: None,
            invoice: None,
            wetman_entry: None,
            material_receipt: None,
        }
    }

    pub fn stage_completed(&self, stage: Stage) -> bool {
        match stage {
            Stage::PoCheck => self.po_check.is_some(),
            Stage::DeliveryCheck => self.delivery_check.is_some(),
            Stage::DispatchPlanning => self.dispatch_planning.is_some(),
            Stage::Logistics => self.logistics.is_some(),
            Stage::TestReport => self.test_report.is_some(),
            Stage::Invoice => self.invoice.is_some(),
            Stage::WetmanEntry => self.wetman_entry.is_some(),
            Stage::MaterialReceipt => self.material_receipt.is_some(),
        }
    }

    pub fn ds_number(&self) -> Option<&str> {
        self.dispatch_planning
            .as_ref()
            .map(|plan| plan.ds_number.as_str())
    }

    pub fn lgst_number(&self) -> Option<&str> {
        self.logistics
            .as_ref()
            .map(|record| record.lgst_number.as_str())
    }

    /// Records a transition: bumps the version and the update timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percentage");
        err.message = Some("must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}
