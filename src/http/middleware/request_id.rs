//! Request ID middleware.
//!
//! Reuses an incoming `x-request-id` header or generates a UUID v4, makes it
//! available to handlers as a [`RequestId`] extension and echoes it on the
//! response.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use crate::http::middleware::chain::{Middleware, Next};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Access the request ID from request extensions.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestId>().map(|id| id.0.as_str())
    }
}

/// Middleware assigning a request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn call(&self, mut req: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let header = HeaderValue::from_str(&id).ok();
        if let Some(value) = &header {
            req.headers_mut().insert(X_REQUEST_ID, value.clone());
        }
        req.extensions_mut().insert(RequestId(id));

        async move {
            let mut res = next.run(req).await;
            if let Some(value) = header {
                res.headers_mut().insert(X_REQUEST_ID, value);
            }
            res
        }
        .boxed()
    }

    fn name(&self) -> &'static str {
        "request_id"
    }
}
