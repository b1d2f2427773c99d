#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use o2d_api::{
    config::{AppConfig, STORAGE_BACKEND_IN_MEMORY, STORAGE_BACKEND_JSON_FILE},
    errors::ServiceError,
    events::{self, EventSender},
    AppState,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness driving the full router in-process.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Fresh application backed by the in-memory repository.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.storage_backend = STORAGE_BACKEND_IN_MEMORY.to_string();
        Self::with_config(cfg).await.expect("failed to build test app")
    }

    /// Application persisting to JSON files under `dir`.
    pub async fn with_data_dir(dir: &Path) -> Result<Self, ServiceError> {
        let mut cfg = AppConfig::new("127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.storage_backend = STORAGE_BACKEND_JSON_FILE.to_string();
        cfg.data_dir = dir.to_path_buf();
        Self::with_config(cfg).await
    }

    pub async fn with_config(cfg: AppConfig) -> Result<Self, ServiceError> {
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let event_sender = Arc::new(EventSender::new(event_tx));

        let state = AppState::bootstrap(cfg, event_sender).await?;
        Ok(Self {
            router: o2d_api::app_router(state.clone()),
            state,
            _event_task: event_task,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        self.request_with_headers(method, uri, body, token, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Logs in through the API and returns the bearer token.
    pub async fn login(&self, id: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "id": id, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "login failed for {}", id);
        let body = response_json(response).await;
        body["token"].as_str().expect("token in login response").to_string()
    }

    /// Creates an order and returns the response body.
    pub async fn create_order(&self, token: &str, payload: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/v1/orders", Some(payload), Some(token))
            .await;
        assert_eq!(response.status(), 201, "order creation failed");
        response_json(response).await
    }

    pub async fn submit_stage(
        &self,
        token: &str,
        order_id: &str,
        stage: &str,
        form: Value,
    ) -> Response {
        self.request(
            Method::POST,
            &format!("/api/v1/orders/{}/stages/{}", order_id, stage),
            Some(form),
            Some(token),
        )
        .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn order_payload(po_number: &str) -> Value {
    json!({
        "partyPoNumber": po_number,
        "partyPoDate": "2024-01-02",
        "gstNumber": "27ABCDE1234F1Z5",
        "partyName": "Acme Refractories",
        "totalPoValue": "25000",
        "typeOfTransporting": "FOR",
        "products": [
            { "productName": "High Alumina Brick", "quantity": "10", "rate": "2500", "uom": "MT" }
        ]
    })
}

pub fn order_payload_for_firm(po_number: &str, firm: &str) -> Value {
    let mut payload = order_payload(po_number);
    payload["firmName"] = json!(firm);
    payload
}

/// A valid form for every stage, in workflow order.
pub fn stage_forms() -> Vec<(&'static str, Value)> {
    vec![
        ("po-check", json!({ "expectedDeliveryDate": "2024-01-10" })),
        ("delivery-check", json!({ "inStockOrNot": "In Stock" })),
        (
            "dispatch-planning",
            json!({ "dateOfDispatch": "2024-01-12", "crmName": "Ravi" }),
        ),
        (
            "logistics",
            json!({
                "transporterName": "Swift Roadways",
                "truckNo": "GJ01AB1234",
                "driverMobileNo": "9876543210",
                "biltyNo": "BLT-77",
                "typeOfRate": "Per Matric Ton rate",
                "transportRatePerTon": "850"
            }),
        ),
        ("test-report", json!({ "uniqueKey": "UK-1", "stepKey": "SK-1" })),
        ("invoice", json!({ "quantityDelivered": "10", "billNo": "BILL-1" })),
        (
            "wetman-entry",
            json!({ "actualQtyLoadedTruck": "10", "actualQtyWeighmentSlip": "9.98" }),
        ),
        (
            "material-receipt",
            json!({ "materialReceivedDate": "2024-01-20", "grnNumber": "GRN-1" }),
        ),
    ]
}
