use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Stage;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when nobody is listening.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "domain event dropped");
        }
    }
}

/// Domain events emitted after a successful state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        serial_no: String,
        firm: String,
    },
    StageCompleted {
        order_id: Uuid,
        stage: Stage,
        version: u64,
    },
    FastTrackedToDispatch {
        order_id: Uuid,
        ds_number: String,
    },
    OrdersReplaced {
        count: usize,
    },
    SessionStarted {
        user_id: String,
    },
    SessionEnded {
        user_id: String,
    },
}

/// Drains the event channel, logging each event until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                serial_no,
                firm,
            } => info!(%order_id, %serial_no, %firm, "order created"),
            Event::StageCompleted {
                order_id,
                stage,
                version,
            } => info!(%order_id, %stage, version, "stage completed"),
            Event::FastTrackedToDispatch {
                order_id,
                ds_number,
            } => info!(%order_id, %ds_number, "order fast-tracked to dispatch"),
            Event::OrdersReplaced { count } => info!(count, "order list replaced"),
            Event::SessionStarted { user_id } => info!(%user_id, "session started"),
            Event::SessionEnded { user_id } => info!(%user_id, "session ended"),
        }
    }

    info!("Event processing loop finished");
}
