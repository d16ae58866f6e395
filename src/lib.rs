pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod websocket;
pub mod ws;

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use chrono::{DateTime, Utc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use docs::ApiDoc;
use ws::hub::Hub;

/// Shared state handed to every handler.
pub struct AppState {
    pub hub: Hub,
    pub started_at: DateTime<Utc>,
}

/// Build the full application router: the collaboration endpoint at the
/// root, the API routes under /api, and the Swagger UI.
pub fn app(config: &Config) -> Router {
    let state = Arc::new(AppState {
        hub: Hub::new(config.activity_log_limit),
        started_at: Utc::now(),
    });

    Router::new()
        .route("/", get(websocket::handler::collab_endpoint))
        .nest("/api", routes::create_api_routes())
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_origins.as_deref() {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
