use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use yarnhub_assistant::CompletionWaiter;
use yarnhub_core::config::{GatewayConfig, WEBHOOK_PATH};

/// Shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub gateway: GatewayConfig,
    /// Owns the backend client; each request opens its own thread through it.
    pub waiter: CompletionWaiter,
}

impl AppState {
    pub fn new(gateway: GatewayConfig, waiter: CompletionWaiter) -> Self {
        Self { gateway, waiter }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors_allow_any = state.gateway.cors_allow_any;

    let router = Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(WEBHOOK_PATH, post(crate::http::webhook::webhook_handler))
        .with_state(state);

    let router = if cors_allow_any {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
    } else {
        router
    };

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}
