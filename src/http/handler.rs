//! Request handler interface.
//!
//! Handlers are opaque to the routing core: it stores them, clones the
//! `Arc`, and calls them once a route is selected.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::{BoxFuture, FutureExt};

/// Terminal request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        self(req).boxed()
    }
}

/// Shared handler reference stored in the route table.
pub type BoxHandler = Arc<dyn Handler>;

/// Wrap a handler for storage.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

/// Handler returning a fixed response. Used for routes defined in the
/// config file or through the admin API.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    status: StatusCode,
    content_type: HeaderValue,
    body: Arc<str>,
}

impl StaticResponse {
    pub fn new(status: StatusCode, content_type: HeaderValue, body: impl Into<Arc<str>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// `200 OK` plain text.
    pub fn text(body: impl Into<Arc<str>>) -> Self {
        Self::new(
            StatusCode::OK,
            HeaderValue::from_static("text/plain; charset=utf-8"),
            body,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Handler for StaticResponse {
    fn call(&self, _req: Request<Body>) -> BoxFuture<'static, Response> {
        let response = (
            self.status,
            [(header::CONTENT_TYPE, self.content_type.clone())],
            self.body.to_string(),
        )
            .into_response();
        futures_util::future::ready(response).boxed()
    }
}
