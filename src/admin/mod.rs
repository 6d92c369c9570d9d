//! Admin API.
//!
//! # Responsibilities
//! - Expose the route table and middleware chain mutation API over HTTP
//! - Authenticate every call with a bearer token
//!
//! # Design Decisions
//! - Served on its own listener, never through the dynamic routes
//! - Only static-response routes can be created remotely; code-defined
//!   handlers and middlewares can be listed and removed

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::resolver::Resolver;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub resolver: Resolver,
    pub api_key: Arc<str>,
    pub started: Instant,
}

impl AdminState {
    pub fn new(resolver: Resolver, api_key: &str, started: Instant) -> Self {
        Self {
            resolver,
            api_key: Arc::from(api_key),
            started,
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(list_routes).post(add_route))
        .route("/admin/routes/remove", post(remove_route))
        .route("/admin/routes/clear", post(clear_routes))
        .route("/admin/domains/{pattern}", delete(remove_domain))
        .route("/admin/middlewares", get(list_middlewares))
        .route("/admin/middlewares/clear", post(clear_middlewares))
        .route("/admin/middlewares/{index}", delete(remove_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
