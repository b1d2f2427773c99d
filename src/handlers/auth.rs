use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};

use super::common::{json_body, no_content_response};
use crate::{
    auth::{AuthUser, LoginRequest, LoginResponse},
    errors::ServiceError,
    models::SessionUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Log in",
    description = "Exchange an id and password for a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 400, description = "Missing id or password", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let request = json_body(body)?;
    let response = state.services.auth.login(&request).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    summary = "Log out",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> Response {
    state.services.auth.logout(&auth_user.token).await;
    no_content_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    summary = "Current user",
    responses(
        (status = 200, description = "The session user", body = SessionUser),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth_user: AuthUser) -> impl IntoResponse {
    Json(auth_user.user)
}
