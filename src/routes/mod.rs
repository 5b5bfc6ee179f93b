pub mod subscriptions;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/health",
            get(|| async { axum::Json(serde_json::json!({"ok": true})) }),
        )
        .merge(subscriptions::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
