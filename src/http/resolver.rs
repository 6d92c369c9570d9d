//! Per-request entry point.
//!
//! # Responsibilities
//! - Ask the route table for the best entry for (host, method, path)
//! - Wrap the selected handler with the current middleware snapshot
//! - Report "method not allowed" separately from "not found"
//! - Plug into an Axum application as a match-all fallback service
//!
//! # Design Decisions
//! - Table lookup and chain composition are synchronous; once a request has
//!   its composed chain, later mutations cannot affect it
//! - The resolver owns shared handles to the table and the chain; it is
//!   created at attachment time and cloned into the service

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::future::{BoxFuture, FutureExt};
use tower::Service;

use crate::http::handler::BoxHandler;
use crate::http::middleware::chain::{MiddlewareChain, Next};
use crate::observability::metrics;
use crate::routing::{Resolution, RouteTable};

/// Route table holding boxed HTTP handlers.
pub type HandlerTable = RouteTable<BoxHandler>;

/// Result of resolving one request.
#[derive(Debug)]
pub enum MatchOutcome {
    /// The selected handler, already wrapped by the middleware chain.
    Matched(Next),
    /// Path and domain matched but no entry accepts the method.
    MethodNotAllowed { allowed: Vec<Method> },
    /// Nothing matched.
    NotFound,
}

impl MatchOutcome {
    fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Matched(_) => "matched",
            MatchOutcome::MethodNotAllowed { .. } => "method_not_allowed",
            MatchOutcome::NotFound => "not_found",
        }
    }
}

/// Dynamic routing resource.
#[derive(Clone, Default)]
pub struct Resolver {
    routes: Arc<HandlerTable>,
    middlewares: Arc<MiddlewareChain>,
}

impl Resolver {
    /// Resolver with an empty table and chain.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(routes: Arc<HandlerTable>, middlewares: Arc<MiddlewareChain>) -> Self {
        Self {
            routes,
            middlewares,
        }
    }

    /// The live route table. Mutations apply to the next resolved request.
    pub fn routes(&self) -> &Arc<HandlerTable> {
        &self.routes
    }

    /// The live middleware chain.
    pub fn middlewares(&self) -> &Arc<MiddlewareChain> {
        &self.middlewares
    }

    pub fn resolve(&self, domain: &str, method: &Method, path: &str) -> MatchOutcome {
        let outcome = match self.routes.resolve(domain, method, path) {
            Resolution::Found(entry) => {
                tracing::trace!(
                    domain = %entry.domain(),
                    method = %entry.method(),
                    path,
                    "Route matched"
                );
                MatchOutcome::Matched(self.middlewares.bind(entry.into_handler()))
            }
            Resolution::MethodNotAllowed { allowed } => MatchOutcome::MethodNotAllowed { allowed },
            Resolution::NotFound => MatchOutcome::NotFound,
        };

        metrics::record_resolution(outcome.label());
        outcome
    }

    /// Resolve and run a request. `None` means no route matched and the
    /// request should fall through.
    pub async fn dispatch(&self, req: Request<Body>) -> Option<Response> {
        let host = request_host(&req);
        let outcome = self.resolve(&host, req.method(), req.uri().path());

        match outcome {
            MatchOutcome::Matched(next) => Some(next.run(req).await),
            MatchOutcome::MethodNotAllowed { allowed } => {
                tracing::debug!(host = %host, method = %req.method(), "Method not allowed");
                Some(method_not_allowed(&allowed))
            }
            MatchOutcome::NotFound => None,
        }
    }

    pub fn service(&self) -> ResolverService {
        ResolverService {
            resolver: self.clone(),
        }
    }

    /// Register this resolver as the match-all fallback of `app`.
    pub fn attach<S>(&self, app: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        app.fallback_service(self.service())
    }
}

/// Host used for domain matching: the `Host` header, else the URI authority.
pub fn request_host<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string()
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut res = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        res.headers_mut().insert(header::ALLOW, value);
    }
    res
}

/// Tower service wrapping a [`Resolver`]. Unmatched requests get `404`.
#[derive(Clone)]
pub struct ResolverService {
    resolver: Resolver,
}

impl Service<Request<Body>> for ResolverService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let resolver = self.resolver.clone();
        async move {
            let res = resolver
                .dispatch(req)
                .await
                .unwrap_or_else(|| (StatusCode::NOT_FOUND, "No matching route found").into_response());
            Ok(res)
        }
        .boxed()
    }
}
