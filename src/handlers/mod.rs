pub mod auth;
pub mod common;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod stages;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::events::EventSender;
use crate::services::orders::OrderService;
use crate::store::OrderStore;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(
        store: Arc<OrderStore>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(store, event_sender)),
            auth,
        }
    }
}
