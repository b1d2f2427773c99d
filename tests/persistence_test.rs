//! JSON-file persistence: reload fidelity, atomic writes and malformed state.

mod common;

use assert_matches::assert_matches;
use axum::http::Method;
use common::{order_payload, response_json, stage_forms, TestApp};
use o2d_api::errors::ServiceError;
use o2d_api::models::Order;
use o2d_api::repositories::{CurrentUserRepository, JsonStore};
use o2d_api::models::{Role, SessionUser};

#[tokio::test]
async fn orders_survive_a_restart_field_for_field() {
    let dir = tempfile::tempdir().unwrap();

    let before = {
        let app = TestApp::with_data_dir(dir.path()).await.unwrap();
        let token = app.login("admin1", "adminA").await;
        let order = app.create_order(&token, order_payload("PO-P1")).await;
        app.create_order(&token, order_payload("PO-P2")).await;

        let order_id = order["id"].as_str().unwrap();
        for (stage, form) in stage_forms().into_iter().take(4) {
            let response = app.submit_stage(&token, order_id, stage, form).await;
            assert_eq!(response.status(), 200);
        }
        app.state.services.orders.store().read_orders().await
    };

    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["orders.json"]);

    let reopened = TestApp::with_data_dir(dir.path()).await.unwrap();
    let after = reopened.state.services.orders.store().read_orders().await;
    assert_eq!(before, after);

    // Sequences continue from the persisted list.
    let token = reopened.login("admin1", "adminA").await;
    let third = reopened.create_order(&token, order_payload("PO-P3")).await;
    assert_eq!(third["serialNo"], "AAA-003");
}

#[tokio::test]
async fn persisted_file_is_a_plain_order_array() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::with_data_dir(dir.path()).await.unwrap();
    let token = app.login("admin4", "adminDDD").await;
    app.create_order(&token, order_payload("PO-D1")).await;

    let raw = std::fs::read_to_string(dir.path().join("orders.json")).unwrap();
    let orders: Vec<Order> = serde_json::from_str(&raw).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].serial_no, "DDD-001");
    assert_eq!(orders[0].firm_name, "DDD");
}

#[tokio::test]
async fn malformed_state_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("orders.json"), "{ not json").unwrap();

    let Err(err) = TestApp::with_data_dir(dir.path()).await else {
        panic!("malformed orders file must not open");
    };
    assert_matches!(err, ServiceError::SerializationError(_));
}

#[tokio::test]
async fn missing_directory_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("not-yet-created");

    let app = TestApp::with_data_dir(&nested).await.unwrap();
    let token = app.login("master", "master123").await;
    let list = app
        .request(Method::GET, "/api/v1/orders", None, Some(&token))
        .await;
    assert!(response_json(list).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn current_user_is_stored_under_fixed_key() {
    let dir = tempfile::tempdir().unwrap();
    let repo = CurrentUserRepository::new(JsonStore::new(dir.path()));
    let user = SessionUser {
        id: "admin3".into(),
        role: Role::Admin,
        firm: "CCC".into(),
        name: "CCC Admin".into(),
    };

    repo.set(&user).await.unwrap();
    assert!(dir.path().join("currentUser.json").exists());
    assert_eq!(repo.current().await.unwrap(), Some(user));

    repo.clear().await.unwrap();
    assert_eq!(repo.current().await.unwrap(), None);
}
