//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::live_reload;
use crate::middleware::security;
use crate::state::AppState;

/// Path of the live reload WebSocket.
pub(crate) const LIVE_RELOAD_WS_PATH: &str = "/__paul/live-reload";

/// Path of the live reload client script.
pub(crate) const LIVE_RELOAD_SCRIPT_PATH: &str = "/__paul/live-reload.js";

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new().route("/__paul/pages", get(handlers::routes::list_pages));

    if state.live_reload_enabled() {
        router = router
            .route(LIVE_RELOAD_WS_PATH, get(live_reload::ws_handler))
            .route(LIVE_RELOAD_SCRIPT_PATH, get(live_reload::client_script));
    }

    // Pages, then public files, then 404
    router = router.fallback(handlers::pages::serve);
    router = security::layers().fold(router, |router, layer| router.layer(layer));

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
