use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use skillcheck::auth::{Authenticator, CredentialStore, SessionStore};
use skillcheck::checklist::{skillcheck_router, AnswerStore, SkillCheckService};
use std::sync::Arc;

/// Checklist API plus the operational endpoints. The caller layers in `AppState`.
pub(crate) fn with_skillcheck_routes<S, C, T>(
    service: Arc<SkillCheckService<S>>,
    auth: Arc<Authenticator<C, T>>,
) -> axum::Router
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    skillcheck_router(service, auth)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
