use axum::{extract::State, response::Json};

use crate::{auth::AuthUser, services::orders::DashboardSummary, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    summary = "Dashboard summary",
    description = "Order totals, per-firm revenue, per-stage counts and the most recent orders",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Json<DashboardSummary> {
    Json(state.services.orders.dashboard(&auth_user.user).await)
}
