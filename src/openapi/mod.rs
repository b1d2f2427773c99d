use axum::response::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "O2D API",
        version = "1.0.0",
        description = r#"
# Order-to-Delivery Workflow API

Orders move through eight stages, each unlocked by the one before it:

1. PO check
2. Delivery check
3. Dispatch planning (issues the DS number)
4. Logistics (issues the LGST number)
5. Test report
6. Invoice
7. Wetman entry
8. Material receipt

## Authentication

Log in with `POST /api/v1/auth/login` and send the returned token as

```
Authorization: Bearer <token>
```

Non-master users only ever see orders of their own firm.

## Concurrency

Stage submissions may carry `If-Match: <version>`; a stale version is rejected with 409.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Session endpoints"),
        (name = "Orders", description = "Order management endpoints"),
        (name = "Stages", description = "Stage views and submissions"),
        (name = "Dashboard", description = "Summary endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::replace_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::fast_track,

        crate::handlers::stages::list_stages,
        crate::handlers::stages::get_stage,
        crate::handlers::stages::submit_stage,

        crate::handlers::dashboard::dashboard,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::auth::LoginRequest,
            crate::auth::LoginResponse,
            crate::models::SessionUser,
            crate::models::Role,

            crate::models::Order,
            crate::models::OrderDetails,
            crate::models::OrderStatus,
            crate::models::Product,
            crate::models::Stage,
            crate::models::StockSource,
            crate::models::TransportingType,
            crate::models::FreightRate,
            crate::services::orders::OrderView,
            crate::services::orders::OrderTab,
            crate::handlers::orders::ReplaceOrdersResponse,
            crate::commands::orders::CreateOrderRequest,

            // Stage forms
            crate::commands::orders::PoCheckForm,
            crate::commands::orders::DeliveryCheckForm,
            crate::commands::orders::DispatchPlanForm,
            crate::commands::orders::LogisticsForm,
            crate::commands::orders::RateType,
            crate::commands::orders::TestReportForm,
            crate::commands::orders::InvoiceForm,
            crate::commands::orders::WetmanEntryForm,
            crate::commands::orders::MaterialReceiptForm,

            crate::services::orders::StageView,
            crate::services::orders::StageCount,
            crate::services::orders::DashboardSummary,
            crate::handlers::health::HealthResponse,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Serves the generated document at `/api-docs/openapi.json`.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}
