pub mod order;
pub mod stage;
pub mod user;

pub use order::{
    DeliveryCheckRecord, DispatchPlanRecord, FreightRate, InvoiceRecord, LogisticsRecord,
    MaterialReceiptRecord, Order, OrderDetails, OrderStatus, PoCheckRecord, Product,
    TestReportRecord, WetmanEntryRecord,
};
pub use stage::{Stage, StockSource, TransportingType};
pub use user::{Role, SessionUser, User, ALL_FIRMS};
