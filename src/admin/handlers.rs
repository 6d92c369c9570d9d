//! Admin API handlers.
//!
//! Each handler maps one management call onto the live route table or
//! middleware chain. Changes apply to the next request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::AdminState;
use crate::config::{parse_route, RouteConfig};
use crate::http::handler::boxed;
use crate::routing::{AddOptions, MethodFilter, RouteError, RouteInfo, ANY_DOMAIN};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("{0}")]
    BadRequest(String),

    #[error("no such route")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Route(RouteError::DuplicateEntry { .. }) => StatusCode::CONFLICT,
            ApiError::Route(RouteError::IndexOutOfRange { .. }) | ApiError::NotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Route(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub middlewares: usize,
    pub uptime_secs: u64,
}

/// Body of `POST /admin/routes`.
#[derive(Debug, Deserialize)]
pub struct AddRouteRequest {
    #[serde(flatten)]
    pub route: RouteConfig,

    #[serde(default = "default_true")]
    pub overwrite: bool,

    #[serde(default = "default_true")]
    pub preserve_any: bool,
}

/// Body of `POST /admin/routes/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveRouteRequest {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_method")]
    pub method: String,

    pub path: String,
}

#[derive(Serialize)]
pub struct MiddlewareInfo {
    pub index: usize,
    pub name: &'static str,
}

#[derive(Serialize)]
pub struct Removed {
    pub removed: usize,
}

fn default_true() -> bool {
    true
}

fn default_domain() -> String {
    ANY_DOMAIN.to_string()
}

fn default_method() -> String {
    crate::routing::ANY_METHOD.to_string()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.resolver.routes().len(),
        middlewares: state.resolver.middlewares().len(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

pub async fn list_routes(State(state): State<AdminState>) -> Json<Vec<RouteInfo>> {
    Json(state.resolver.routes().routes())
}

pub async fn add_route(
    State(state): State<AdminState>,
    Json(req): Json<AddRouteRequest>,
) -> Result<(StatusCode, Json<RouteInfo>), ApiError> {
    let parsed = parse_route(&req.route).map_err(ApiError::BadRequest)?;
    let options = AddOptions {
        overwrite: req.overwrite,
        preserve_any: req.preserve_any,
    };

    let info = RouteInfo {
        domain: parsed.domain.to_string(),
        method: parsed.method.to_string(),
        path: parsed.path.clone(),
    };
    state.resolver.routes().add(
        parsed.method,
        &parsed.path,
        boxed(parsed.response),
        &info.domain,
        options,
    )?;

    tracing::info!(domain = %info.domain, method = %info.method, path = %info.path, "Route added via admin API");
    Ok((StatusCode::CREATED, Json(info)))
}

pub async fn remove_route(
    State(state): State<AdminState>,
    Json(req): Json<RemoveRouteRequest>,
) -> Result<Json<Removed>, ApiError> {
    let method: MethodFilter = req.method.parse()?;

    if state.resolver.routes().remove(method, &req.path, &req.domain) {
        tracing::info!(domain = %req.domain, method = %req.method, path = %req.path, "Route removed via admin API");
        Ok(Json(Removed { removed: 1 }))
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn clear_routes(State(state): State<AdminState>) -> Json<Removed> {
    let removed = state.resolver.routes().clear();
    tracing::info!(removed, "Route table cleared via admin API");
    Json(Removed { removed })
}

pub async fn remove_domain(
    State(state): State<AdminState>,
    Path(pattern): Path<String>,
) -> Json<Removed> {
    let removed = state.resolver.routes().remove_domain(&pattern);
    tracing::info!(%pattern, removed, "Domain removed via admin API");
    Json(Removed { removed })
}

pub async fn list_middlewares(State(state): State<AdminState>) -> Json<Vec<MiddlewareInfo>> {
    let list = state
        .resolver
        .middlewares()
        .snapshot()
        .iter()
        .enumerate()
        .map(|(index, m)| MiddlewareInfo {
            index,
            name: m.name(),
        })
        .collect();
    Json(list)
}

pub async fn remove_middleware(
    State(state): State<AdminState>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    state.resolver.middlewares().remove_at(index)?;
    tracing::info!(index, "Middleware removed via admin API");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_middlewares(State(state): State<AdminState>) -> StatusCode {
    state.resolver.middlewares().clear();
    tracing::info!("Middleware chain cleared via admin API");
    StatusCode::NO_CONTENT
}
