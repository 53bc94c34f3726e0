//! Route configuration and setup

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use adlaunch_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// JSON request bodies only; media bytes never travel through this API
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: AppState) -> Result<Router> {
    let cors = setup_cors(config)?;

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/api/v0/ads/launch", post(handlers::launch_ads::launch_ads))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors);

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let origins = config.cors_origins();
    let cors = if origins.iter().any(|o| o == "*") {
        // from_env rejects the wildcard in production
        CorsLayer::new().allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", origin))
            })
            .collect::<Result<_>>()?;
        CorsLayer::new().allow_origin(parsed)
    };

    Ok(cors
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}
