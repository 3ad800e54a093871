use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use memory_insights_analytics::{peer_key_catalog, sphere_key_catalog, KEY_SCHEME_VERSION};
use memory_insights_schemas::{EntityId, KeyCatalog, Sphere};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::composer::InsightComposer;
use crate::source::SourceError;

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<InsightComposer>,
}

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/v1/entities/:entity_id/insight", get(entity_insight))
        .route("/v1/spheres/dominant", get(dominant_sphere))
        .route("/v1/spheres/:sphere_a/:sphere_b/insight", get(sphere_insight))
        .route("/v1/keys/:domain", get(key_catalog))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "insights",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn to_response_error(e: anyhow::Error) -> (StatusCode, String) {
    match e.downcast_ref::<SourceError>() {
        Some(SourceError::EntityNotFound(id)) => {
            (StatusCode::NOT_FOUND, format!("entity not found: {}", id))
        }
        _ => {
            error!("Failed to build insight: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn entity_insight(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Query(query): Query<DomainQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    info!(
        "Entity insight request: entity={}, domain={:?}",
        entity_id, query.domain
    );

    let insight = state
        .composer
        .entity_insight(&EntityId(entity_id), query.domain.as_deref())
        .await
        .map_err(to_response_error)?;

    Ok(Json(insight))
}

async fn sphere_insight(
    State(state): State<AppState>,
    Path((sphere_a, sphere_b)): Path<(Sphere, Sphere)>,
    Query(query): Query<DomainQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    info!(
        "Sphere insight request: {} vs {}, domain={:?}",
        sphere_a, sphere_b, query.domain
    );

    let insight = state
        .composer
        .sphere_insight(sphere_a, sphere_b, query.domain.as_deref())
        .await
        .map_err(to_response_error)?;

    Ok(Json(insight))
}

async fn dominant_sphere(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let insight = state
        .composer
        .dominant_sphere_insight(query.domain.as_deref())
        .await
        .map_err(to_response_error)?;

    Ok(Json(insight))
}

async fn key_catalog(Path(domain): Path<String>) -> impl IntoResponse {
    Json(KeyCatalog {
        peer_keys: peer_key_catalog(&domain),
        sphere_keys: sphere_key_catalog(&domain),
        scheme_version: KEY_SCHEME_VERSION,
        domain,
    })
}
