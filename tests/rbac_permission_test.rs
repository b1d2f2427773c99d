//! Authentication and firm-visibility rules over HTTP.

mod common;

use axum::http::Method;
use common::{order_payload, order_payload_for_firm, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn requests_without_a_session_are_unauthorized() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/orders", "/api/v1/stages", "/api/v1/dashboard", "/api/v1/auth/me"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), 401, "{} without token", uri);
    }

    let bogus = app
        .request(Method::GET, "/api/v1/orders", None, Some("not-a-token"))
        .await;
    assert_eq!(bogus.status(), 401);
}

#[tokio::test]
async fn wrong_credentials_are_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "id": "admin1", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Invalid credentials"));
}

#[tokio::test]
async fn me_and_logout_follow_the_session() {
    let app = TestApp::new().await;
    let token = app.login("user2", "userBBB").await;

    let me = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(me.status(), 200);
    let me = response_json(me).await;
    assert_eq!(me["id"], "user2");
    assert_eq!(me["role"], "user");
    assert_eq!(me["firm"], "BBB");
    assert!(me.get("password").is_none());

    let logout = app
        .request(Method::POST, "/api/v1/auth/logout", None, Some(&token))
        .await;
    assert_eq!(logout.status(), 204);

    let after = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(after.status(), 401);
}

#[tokio::test]
async fn other_firms_orders_are_invisible() {
    let app = TestApp::new().await;
    let aaa = app.login("admin1", "adminA").await;
    let bbb = app.login("user2", "userBBB").await;
    let master = app.login("master", "master123").await;

    let order = app.create_order(&aaa, order_payload("PO-A")).await;
    let order_id = order["id"].as_str().unwrap();

    let list = app
        .request(Method::GET, "/api/v1/orders", None, Some(&bbb))
        .await;
    assert!(response_json(list).await.as_array().unwrap().is_empty());

    let fetch = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None, Some(&bbb))
        .await;
    assert_eq!(fetch.status(), 404);

    let submit = app
        .submit_stage(&bbb, order_id, "po-check", json!({ "expectedDeliveryDate": "2024-01-10" }))
        .await;
    assert_eq!(submit.status(), 404);

    let view = app
        .request(Method::GET, "/api/v1/stages/po-check", None, Some(&bbb))
        .await;
    let view = response_json(view).await;
    assert!(view["pending"].as_array().unwrap().is_empty());

    let dashboard = app
        .request(Method::GET, "/api/v1/dashboard", None, Some(&bbb))
        .await;
    let dashboard = response_json(dashboard).await;
    assert_eq!(dashboard["totalOrders"], 0);
    assert_eq!(dashboard["firms"][0]["firm"], "BBB");
    assert_eq!(dashboard["firms"][0]["orders"], 0);

    let master_list = app
        .request(Method::GET, "/api/v1/orders", None, Some(&master))
        .await;
    assert_eq!(response_json(master_list).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn creation_firm_rules() {
    let app = TestApp::new().await;
    let master = app.login("master", "master123").await;
    let user = app.login("user1", "userA").await;

    let no_firm = app
        .request(Method::POST, "/api/v1/orders", Some(order_payload("PO-M")), Some(&master))
        .await;
    assert_eq!(no_firm.status(), 400);

    let other_firm = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload_for_firm("PO-U", "DDD")),
            Some(&user),
        )
        .await;
    assert_eq!(other_firm.status(), 403);

    let own = app.create_order(&user, order_payload("PO-U")).await;
    assert_eq!(own["firmName"], "AAA");

    let for_ddd = app
        .create_order(&master, order_payload_for_firm("PO-M", "DDD"))
        .await;
    assert_eq!(for_ddd["serialNo"], "DDD-001");
}

#[tokio::test]
async fn only_master_may_replace_orders() {
    let app = TestApp::new().await;
    let admin = app.login("admin1", "adminA").await;
    let master = app.login("master", "master123").await;

    let order = app.create_order(&admin, order_payload("PO-R")).await;

    let forbidden = app
        .request(
            Method::PUT,
            "/api/v1/orders",
            Some(json!([order.clone()])),
            Some(&admin),
        )
        .await;
    assert_eq!(forbidden.status(), 403);

    let duplicated = app
        .request(
            Method::PUT,
            "/api/v1/orders",
            Some(json!([order.clone(), order.clone()])),
            Some(&master),
        )
        .await;
    assert_eq!(duplicated.status(), 409);

    let replaced = app
        .request(Method::PUT, "/api/v1/orders", Some(json!([])), Some(&master))
        .await;
    assert_eq!(replaced.status(), 200);
    assert_eq!(response_json(replaced).await["count"], 0);
    assert!(app.state.services.orders.store().is_empty().await);
}
