//! Runtime-mutable middleware chain.
//!
//! # Responsibilities
//! - Keep an ordered list of middlewares that can change while serving
//! - Compose a snapshot of the list around a terminal handler per request
//!
//! # Design Decisions
//! - List order is execution order; there is no priority computation
//! - Composition works on an `Arc` snapshot, so a request that has started
//!   keeps the chain it started with
//! - Mutations are copy-on-write, like the route table

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, response::Response};
use futures_util::future::{BoxFuture, FutureExt};

use crate::http::handler::BoxHandler;
use crate::observability::metrics;
use crate::routing::RouteError;

/// A request-wrapping handler.
///
/// Receives the request and the remainder of the chain. It may call
/// `next.run` once, several times (after cloning `next`), or not at all.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request<Body>, next: Next) -> BoxFuture<'static, Response>;

    /// Label shown by the admin API.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        self(req, next).boxed()
    }
}

pub type BoxMiddleware = Arc<dyn Middleware>;

/// The remainder of a composed chain.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[BoxMiddleware]>,
    index: usize,
    endpoint: BoxHandler,
}

impl Next {
    /// Compose `chain` around `endpoint`.
    pub fn new(chain: Arc<[BoxMiddleware]>, endpoint: BoxHandler) -> Self {
        Self {
            chain,
            index: 0,
            endpoint,
        }
    }

    /// Run the next middleware, or the endpoint once the chain is exhausted.
    pub async fn run(self, req: Request<Body>) -> Response {
        let middleware = self.chain.get(self.index).cloned();
        match middleware {
            Some(middleware) => {
                let next = Next {
                    index: self.index + 1,
                    ..self
                };
                middleware.call(req, next).await
            }
            None => self.endpoint.call(req).await,
        }
    }

    /// Middlewares still to run before the endpoint.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Ordered, mutable middleware list shared by all requests.
pub struct MiddlewareChain {
    current: ArcSwap<Vec<BoxMiddleware>>,
    writer: Mutex<()>,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Apply `f` to a copy of the list and publish it if `f` succeeds.
    fn try_modify<R, E>(
        &self,
        f: impl FnOnce(&mut Vec<BoxMiddleware>) -> Result<R, E>,
    ) -> Result<R, E> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&self.current.load());
        let out = f(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(out)
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Vec<BoxMiddleware>) -> R) -> R {
        match self.try_modify(|list| Ok::<R, Infallible>(f(list))) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    /// Append to the end of the chain. Returns the new entry's index.
    pub fn append<M: Middleware>(&self, middleware: M) -> usize {
        self.append_boxed(Arc::new(middleware))
    }

    pub fn append_boxed(&self, middleware: BoxMiddleware) -> usize {
        let index = self.modify(|list| {
            list.push(middleware);
            list.len() - 1
        });

        metrics::record_middleware_mutation("append");
        tracing::debug!(index, "Middleware appended");
        index
    }

    /// Remove the entry at `index`. Later entries shift down by one.
    pub fn remove_at(&self, index: usize) -> Result<(), RouteError> {
        self.try_modify(|list| {
            if index >= list.len() {
                return Err(RouteError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            list.remove(index);
            Ok(())
        })?;

        metrics::record_middleware_mutation("remove");
        tracing::debug!(index, "Middleware removed");
        Ok(())
    }

    pub fn clear(&self) {
        self.modify(Vec::clear);
        metrics::record_middleware_mutation("clear");
        tracing::debug!("Middleware chain cleared");
    }

    pub fn get(&self, index: usize) -> Option<BoxMiddleware> {
        self.current.load().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Stable snapshot of the current order.
    pub fn snapshot(&self) -> Arc<[BoxMiddleware]> {
        Arc::from(self.current.load().as_slice())
    }

    /// Compose the current snapshot around `endpoint`.
    pub fn bind(&self, endpoint: BoxHandler) -> Next {
        Next::new(self.snapshot(), endpoint)
    }
}
