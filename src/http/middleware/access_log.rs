//! Access logging middleware.
//! Emits one structured event and one latency sample per dispatched request.

use std::time::Instant;

use axum::{body::Body, http::Request, response::Response};
use futures_util::future::{BoxFuture, FutureExt};

use crate::http::middleware::chain::{Middleware, Next};
use crate::http::middleware::request_id::RequestIdExt;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Middleware for AccessLog {
    fn call(&self, req: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let request_id = req.request_id().unwrap_or("-").to_string();

        async move {
            let res = next.run(req).await;
            let status = res.status().as_u16();

            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request served"
            );
            metrics::record_request(method.as_str(), status, start);
            res
        }
        .boxed()
    }

    fn name(&self) -> &'static str {
        "access_log"
    }
}
