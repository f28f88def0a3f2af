use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::mission::Mission;

use super::api::groups as group_handlers;
use super::api::tracking as tracking_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub mission: Arc<Mutex<Mission>>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tracking lifecycle
        .route("/api/tracking/start", post(tracking_handlers::start))
        .route("/api/tracking/stop", post(tracking_handlers::stop))
        .route("/api/tracking/state", get(tracking_handlers::status))
        // Groups
        .route("/api/groups", get(group_handlers::list_groups))
        .route("/api/groups", post(group_handlers::create_group))
        .route("/api/groups/sync", post(group_handlers::sync_groups))
        .route("/api/groups/{id}", get(group_handlers::get_group))
        .route("/api/groups/{id}", delete(group_handlers::delete_group))
        .route("/api/groups/{id}/end", post(group_handlers::end_group))
        // Swaths
        .route("/api/swaths", get(group_handlers::list_swaths))
        .route("/api/swaths", post(group_handlers::create_swath))
        .route("/api/swaths/{id}", delete(group_handlers::delete_swath))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(bind_addr: &str, mission: Arc<Mutex<Mission>>) -> std::io::Result<()> {
    let app = router(AppState { mission });

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}
