use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// A checkpoint every order passes through, in lifecycle order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    PoCheck,
    DeliveryCheck,
    DispatchPlanning,
    Logistics,
    TestReport,
    Invoice,
    WetmanEntry,
    MaterialReceipt,
}

impl Stage {
    /// Stage that must be complete before this one can be submitted.
    pub fn prerequisite(self) -> Option<Stage> {
        match self {
            Stage::PoCheck => None,
            Stage::DeliveryCheck => Some(Stage::PoCheck),
            Stage::DispatchPlanning => Some(Stage::DeliveryCheck),
            Stage::Logistics => Some(Stage::DispatchPlanning),
            Stage::TestReport => Some(Stage::Logistics),
            Stage::Invoice => Some(Stage::TestReport),
            Stage::WetmanEntry => Some(Stage::Invoice),
            Stage::MaterialReceipt => Some(Stage::WetmanEntry),
        }
    }

    /// Navigation title shown to users.
    pub fn title(self) -> &'static str {
        match self {
            Stage::PoCheck => "Check PO",
            Stage::DeliveryCheck => "Check for Delivery",
            Stage::DispatchPlanning => "Dispatch Planning",
            Stage::Logistics => "Logistic",
            Stage::TestReport => "Test Report",
            Stage::Invoice => "Invoice",
            Stage::WetmanEntry => "Wetman Entry",
            Stage::MaterialReceipt => "Material Receipt",
        }
    }

    pub fn all() -> Vec<Stage> {
        Stage::iter().collect()
    }
}

/// Where the goods for a delivery check come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
pub enum StockSource {
    #[serde(rename = "In Stock")]
    #[strum(serialize = "In Stock")]
    InStock,
    #[serde(rename = "For Production Planning")]
    #[strum(serialize = "For Production Planning")]
    ForProductionPlanning,
    #[serde(rename = "From Purchase")]
    #[strum(serialize = "From Purchase")]
    FromPurchase,
}

/// Who arranges (and pays for) transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
pub enum TransportingType {
    #[serde(rename = "FOR")]
    #[strum(serialize = "FOR")]
    For,
    #[serde(rename = "Ex Factory")]
    #[strum(serialize = "Ex Factory")]
    ExFactory,
    #[serde(rename = "Ex Factory But paid by Us")]
    #[strum(serialize = "Ex Factory But paid by Us")]
    ExFactoryPaidByUs,
}
