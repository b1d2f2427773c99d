use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::{Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::common::{created_response, expected_version, json_body, parse_order_id, query_params};
use crate::{
    auth::AuthUser,
    commands::orders::{CreateOrderRequest, StageTarget},
    errors::ServiceError,
    models::Order,
    services::orders::{OrderQuery, OrderView},
    AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplaceOrdersResponse {
    pub count: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Orders visible to the caller, optionally filtered by a search term and tab",
    params(OrderQuery),
    responses(
        (status = 200, description = "Orders retrieved", body = Vec<OrderView>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderView>>, ServiceError> {
    let query = query_params(query)?;
    let orders = state
        .services
        .orders
        .list_orders(&auth_user.user, &query)
        .await?;
    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Create an order and assign the next serial number for its firm",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = Order,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid order data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Firm not allowed for caller", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serial number collision", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request = json_body(body)?;
    let order = state
        .services
        .orders
        .create_order(&auth_user.user, request)
        .await?;

    info!(order_id = %order.id, serial_no = %order.serial_no, "order created");
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders",
    summary = "Replace all orders",
    description = "Wholesale replacement of the order list. Master only.",
    request_body = Vec<Order>,
    responses(
        (status = 200, description = "Orders replaced", body = ReplaceOrdersResponse),
        (status = 400, description = "Malformed order list", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not master", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate order ids", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn replace_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    body: Result<Json<Vec<Order>>, JsonRejection>,
) -> Result<Json<ReplaceOrdersResponse>, ServiceError> {
    let orders = json_body(body)?;
    let count = state
        .services
        .orders
        .replace_orders(&auth_user.user, orders)
        .await?;
    Ok(Json(ReplaceOrdersResponse { count }))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = String, Path, description = "Order id (UUID)")),
    responses(
        (status = 200, description = "Order retrieved", body = OrderView),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
) -> Result<Json<OrderView>, ServiceError> {
    let id = parse_order_id(&id)?;
    let order = state.services.orders.get_order(&auth_user.user, id).await?;
    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/fast-track",
    summary = "Send to dispatch",
    description = "Fill any missing PO and delivery checks and plan dispatch for today in one step",
    params(
        ("id" = String, Path, description = "Order id (UUID)"),
        ("If-Match" = Option<u64>, Header, description = "Expected order version"),
    ),
    responses(
        (status = 200, description = "Dispatch planned", body = OrderView),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Dispatch already planned or version mismatch", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn fast_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_user: AuthUser,
) -> Result<Json<OrderView>, ServiceError> {
    let id = parse_order_id(&id)?;
    let target = StageTarget::new(id, auth_user.user).expecting_version(expected_version(&headers)?);
    let order = state.services.orders.fast_track_to_dispatch(target).await?;
    Ok(Json(OrderView::from(order)))
}
