use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::answers::{AnswerSheet, AnswerStore};
use super::domain::{DomainError, ItemId, Level, LevelSelection, Sheet, UserId};
use super::filter::CatalogFilter;
use super::service::{ServiceError, SkillCheckService};
use crate::auth::{AuthError, Authenticator, CredentialStore, SessionStore};

/// Shared handler state: the checklist service plus the session gate.
pub struct ApiState<S, C, T> {
    pub service: Arc<SkillCheckService<S>>,
    pub auth: Arc<Authenticator<C, T>>,
}

impl<S, C, T> Clone for ApiState<S, C, T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: Arc::clone(&self.auth),
        }
    }
}

/// Router builder exposing login, checklist and report endpoints.
pub fn skillcheck_router<S, C, T>(
    service: Arc<SkillCheckService<S>>,
    auth: Arc<Authenticator<C, T>>,
) -> Router
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/login", post(login_handler::<S, C, T>))
        .route("/api/v1/logout", post(logout_handler::<S, C, T>))
        .route("/api/v1/sheets", get(sheets_handler::<S, C, T>))
        .route("/api/v1/sheets/:sheet/items", get(items_handler::<S, C, T>))
        .route("/api/v1/sheets/:sheet/answers", put(save_handler::<S, C, T>))
        .route(
            "/api/v1/sheets/:sheet/report",
            get(sheet_report_handler::<S, C, T>),
        )
        .route(
            "/api/v1/reports/overview",
            get(overview_handler::<S, C, T>),
        )
        .route(
            "/api/v1/reports/levels",
            get(level_summary_handler::<S, C, T>),
        )
        .with_state(ApiState { service, auth })
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Comma separated query values, e.g. `?levels=1,2&categories=統計数理`.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    #[serde(default)]
    pub levels: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub required_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LevelQuery {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAnswersRequest {
    pub answers: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct SaveAnswersResponse {
    pub user_id: UserId,
    pub sheet: Sheet,
    pub saved: usize,
    pub achieved: usize,
    pub updated_at: DateTime<Utc>,
}

/// Error surface of the HTTP API, rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(AuthError),
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Internal(message) => {
                error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Unauthorized => Self::Unauthorized(err),
            AuthError::UserExists(_) | AuthError::EmptyPassword | AuthError::Domain(_) => {
                Self::BadRequest(err.to_string())
            }
            AuthError::Store(store) => Self::Internal(store.to_string()),
            AuthError::Hashing(message) => Self::Internal(message),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownItems { .. } => Self::Unprocessable(err.to_string()),
            ServiceError::Store(store) => Self::Internal(store.to_string()),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn authorize<S, C, T>(state: &ApiState<S, C, T>, headers: &HeaderMap) -> Result<UserId, ApiError>
where
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized(AuthError::Unauthorized))?;
    Ok(state.auth.authorize(token)?)
}

fn parse_sheet(raw: &str) -> Result<Sheet, ApiError> {
    raw.parse()
        .map_err(|err: DomainError| ApiError::NotFound(err.to_string()))
}

fn parse_selection(query: &LevelQuery) -> Result<LevelSelection, ApiError> {
    match query.level.as_deref() {
        None => Ok(LevelSelection::All),
        Some(raw) => raw
            .parse()
            .map_err(|err: DomainError| ApiError::BadRequest(err.to_string())),
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl ItemsQuery {
    pub fn to_filter(&self) -> Result<CatalogFilter, ApiError> {
        let levels = split_list(self.levels.as_deref())
            .map(|raw| raw.parse::<Level>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        let categories = split_list(self.categories.as_deref())
            .map(str::to_string)
            .collect();
        Ok(CatalogFilter {
            levels,
            categories,
            required_only: self.required_only,
        })
    }
}

impl SaveAnswersRequest {
    pub fn to_answer_sheet(&self) -> Result<AnswerSheet, ApiError> {
        self.answers
            .iter()
            .map(|(key, achieved)| {
                key.parse::<ItemId>()
                    .map(|id| (id, *achieved))
                    .map_err(|err| ApiError::BadRequest(err.to_string()))
            })
            .collect()
    }
}

pub(crate) async fn login_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let session = state.auth.login(&request.user_id, &request.password)?;
    Ok(Json(LoginResponse {
        user_id: session.user_id,
        token: session.token.to_string(),
        expires_at: session.expires_at,
    }))
}

pub(crate) async fn logout_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(token)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn sheets_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    authorize(&state, &headers)?;
    Ok(Json(state.service.sheets()).into_response())
}

pub(crate) async fn items_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
    Path(sheet): Path<String>,
    Query(query): Query<ItemsQuery>,
) -> Result<Response, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let user_id = authorize(&state, &headers)?;
    let sheet = parse_sheet(&sheet)?;
    let filter = query.to_filter()?;
    let entries = state.service.checklist(&user_id, sheet, &filter)?;
    Ok(Json(entries).into_response())
}

pub(crate) async fn save_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
    Path(sheet): Path<String>,
    Json(request): Json<SaveAnswersRequest>,
) -> Result<Json<SaveAnswersResponse>, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let user_id = authorize(&state, &headers)?;
    let sheet = parse_sheet(&sheet)?;
    let answers = request.to_answer_sheet()?;
    let record = state.service.save(&user_id, sheet, answers)?;

    Ok(Json(SaveAnswersResponse {
        saved: record.answers.len(),
        achieved: record.answers.values().filter(|achieved| **achieved).count(),
        user_id: record.user_id,
        sheet: record.sheet,
        updated_at: record.updated_at,
    }))
}

pub(crate) async fn sheet_report_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
    Path(sheet): Path<String>,
    Query(query): Query<LevelQuery>,
) -> Result<Response, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let user_id = authorize(&state, &headers)?;
    let sheet = parse_sheet(&sheet)?;
    let selection = parse_selection(&query)?;
    let report = state.service.sheet_report(&user_id, sheet, selection)?;
    Ok(Json(report).into_response())
}

pub(crate) async fn overview_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
    Query(query): Query<LevelQuery>,
) -> Result<Response, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let user_id = authorize(&state, &headers)?;
    let selection = parse_selection(&query)?;
    let report = state.service.overview(&user_id, selection)?;
    Ok(Json(report).into_response())
}

pub(crate) async fn level_summary_handler<S, C, T>(
    State(state): State<ApiState<S, C, T>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    S: AnswerStore + 'static,
    C: CredentialStore + 'static,
    T: SessionStore + 'static,
{
    let user_id = authorize(&state, &headers)?;
    let summary = state.service.level_summary(&user_id)?;
    Ok(Json(summary).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_scheme_prefix() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Token abc".parse().expect("header"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn items_query_parses_comma_separated_lists() {
        let query = ItemsQuery {
            levels: Some("1, ★★".to_string()),
            categories: Some("統計数理,,機械学習".to_string()),
            required_only: true,
        };
        let filter = query.to_filter().expect("valid query");
        assert_eq!(filter.levels, BTreeSet::from([Level::One, Level::Two]));
        assert_eq!(filter.categories, vec!["統計数理", "機械学習"]);
        assert!(filter.required_only);

        let empty = ItemsQuery::default().to_filter().expect("valid query");
        assert_eq!(empty, CatalogFilter::default());

        let invalid = ItemsQuery {
            levels: Some("5".to_string()),
            ..ItemsQuery::default()
        };
        assert!(matches!(invalid.to_filter(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn save_request_rejects_non_numeric_keys() {
        let request = SaveAnswersRequest {
            answers: BTreeMap::from([("1".to_string(), true), ("x".to_string(), false)]),
        };
        assert!(matches!(
            request.to_answer_sheet(),
            Err(ApiError::BadRequest(_))
        ));
    }
}
