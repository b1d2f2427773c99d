use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::Json,
};
use serde_json::Value;

use super::common::{
    expected_version, json_body, parse_order_id, parse_stage, query_params,
};
use crate::{
    auth::AuthUser,
    commands::orders::{StageForm, StageTarget},
    errors::ServiceError,
    services::orders::{OrderView, StageCount, StageQuery, StageView},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/stages",
    summary = "Stage catalogue",
    description = "Every stage in workflow order with pending and history counts for the caller",
    responses(
        (status = 200, description = "Stage catalogue", body = Vec<StageCount>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Stages"
)]
pub async fn list_stages(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Json<Vec<StageCount>> {
    Json(state.services.orders.stage_catalogue(&auth_user.user).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/{stage}",
    summary = "Stage view",
    description = "Orders awaiting the stage and orders that have completed it",
    params(
        ("stage" = String, Path, description = "Stage name, e.g. po-check"),
        StageQuery,
    ),
    responses(
        (status = 200, description = "Pending and history lists", body = StageView),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown stage", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Stages"
)]
pub async fn get_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    auth_user: AuthUser,
    query: Result<Query<StageQuery>, QueryRejection>,
) -> Result<Json<StageView>, ServiceError> {
    let stage = parse_stage(&stage)?;
    let query = query_params(query)?;
    let view = state
        .services
        .orders
        .stage_view(&auth_user.user, stage, query.search.as_deref())
        .await;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/stages/{stage}",
    summary = "Submit stage",
    description = "Complete one stage of an order. The body is the form for that stage.",
    params(
        ("id" = String, Path, description = "Order id (UUID)"),
        ("stage" = String, Path, description = "Stage name, e.g. delivery-check"),
        ("If-Match" = Option<u64>, Header, description = "Expected order version"),
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Stage completed", body = OrderView),
        (status = 400, description = "Invalid form or prerequisite stage incomplete", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or stage not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stage already completed or version mismatch", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Stages"
)]
pub async fn submit_stage(
    State(state): State<AppState>,
    Path((id, stage)): Path<(String, String)>,
    headers: HeaderMap,
    auth_user: AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OrderView>, ServiceError> {
    let id = parse_order_id(&id)?;
    let stage = parse_stage(&stage)?;
    let form = StageForm::from_json(stage, json_body(body)?)?;
    let target = StageTarget::new(id, auth_user.user).expecting_version(expected_version(&headers)?);

    let order = state.services.orders.submit_stage(target, form).await?;
    Ok(Json(OrderView::from(order)))
}
