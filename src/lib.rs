//! O2D API Library
//!
//! Order-to-delivery workflow: orders are created per firm and advance through
//! eight gated stages. The HTTP server and the `o2d` CLI share this crate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod store;
pub mod tracing;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};

use crate::auth::{AuthService, IdentityProvider, StaticIdentityProvider};
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::repositories::{InMemoryOrderRepository, JsonOrderRepository, JsonStore, OrderRepository};
use crate::services::sequence::SequenceGenerator;
use crate::store::OrderStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.services.auth.clone()
    }
}

impl AppState {
    /// Wires the repository, order store and identity provider named by `config`.
    pub async fn bootstrap(
        config: config::AppConfig,
        event_sender: Arc<EventSender>,
    ) -> Result<Self, ServiceError> {
        let repository: Arc<dyn OrderRepository> = if config.uses_in_memory_storage() {
            Arc::new(InMemoryOrderRepository::new())
        } else {
            Arc::new(JsonOrderRepository::new(JsonStore::new(config.data_dir.clone())))
        };
        let store = Arc::new(
            OrderStore::open(repository, SequenceGenerator::new(config.prefix_aliases())).await?,
        );

        let identity: Arc<dyn IdentityProvider> = match &config.users_file {
            Some(path) => Arc::new(StaticIdentityProvider::from_file(path)?),
            None => Arc::new(StaticIdentityProvider::seeded()),
        };
        let auth = Arc::new(AuthService::new(identity, event_sender.clone()));

        Ok(Self {
            services: handlers::AppServices::new(store, event_sender, auth),
            config,
        })
    }
}

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me));

    let order_routes = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders)
                .post(handlers::orders::create_order)
                .put(handlers::orders::replace_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/fast-track", post(handlers::orders::fast_track))
        .route("/orders/:id/stages/:stage", post(handlers::stages::submit_stage));

    let stage_routes = Router::new()
        .route("/stages", get(handlers::stages::list_stages))
        .route("/stages/:stage", get(handlers::stages::get_stage));

    Router::new()
        .merge(auth_routes)
        .merge(order_routes)
        .merge(stage_routes)
        .route("/dashboard", get(handlers::dashboard::dashboard))
}

/// The full application minus CORS: health, API docs, the v1 API, request ids
/// and HTTP tracing.
pub fn app_router(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(handlers::health::health_routes())
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
