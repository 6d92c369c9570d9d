//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the resolver as match-all fallback
//! - Wire up tower layers (timeout, tracing)
//! - Seed the route table and middleware chain from config
//! - Apply config file revisions to the live table (hot reload)
//! - Serve the admin API next to the main listener when enabled
//! - Drain both listeners on shutdown

use std::io;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{parse_route, RouteConfig, RouterConfig};
use crate::http::handler::boxed;
use crate::http::middleware::{AccessLog, RequestIdMiddleware};
use crate::http::resolver::{HandlerTable, Resolver};
use crate::lifecycle::Shutdown;
use crate::routing::{AddOptions, MethodFilter};

/// Identity of a route seeded from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SeededRoute {
    method: MethodFilter,
    path: String,
    domain: String,
}

/// HTTP server hosting the dynamic router.
pub struct HttpServer {
    config: RouterConfig,
    resolver: Resolver,
    seeded: Vec<SeededRoute>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        let resolver = Resolver::new();

        if config.middleware.request_id {
            resolver.middlewares().append(RequestIdMiddleware);
        }
        if config.middleware.access_log {
            resolver.middlewares().append(AccessLog);
        }

        let seeded = reseed(resolver.routes(), &[], &config.routes);
        tracing::info!(
            routes = seeded.len(),
            middlewares = resolver.middlewares().len(),
            "Router initialized from config"
        );

        Self {
            config,
            resolver,
            seeded,
        }
    }

    /// Handle to the live table and chain.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The public application.
    pub fn app(&self) -> Router {
        Self::build_router(&self.config, &self.resolver)
    }

    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, resolver: &Resolver) -> Router {
        resolver
            .attach(Router::new())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Binds the admin listener from config when the admin API is enabled.
    /// Every config received on `config_updates` replaces the routes seeded
    /// by the previous revision. Routes added at runtime are kept.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        shutdown: Shutdown,
    ) -> io::Result<()> {
        let admin_listener = if self.config.admin.enabled {
            Some(TcpListener::bind(&self.config.admin.bind_address).await?)
        } else {
            None
        };
        self.serve(listener, admin_listener, config_updates, shutdown)
            .await
    }

    /// Like [`HttpServer::run`], with an already bound admin listener.
    /// `None` disables the admin API regardless of config.
    pub async fn serve(
        self,
        listener: TcpListener,
        admin_listener: Option<TcpListener>,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        shutdown: Shutdown,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let admin_task = match admin_listener {
            Some(admin_listener) => {
                let admin_addr = admin_listener.local_addr()?;
                let admin_app = setup_admin_router(AdminState::new(
                    self.resolver.clone(),
                    &self.config.admin.api_key,
                    Instant::now(),
                ));
                let admin_shutdown = shutdown.subscribe();

                tracing::info!(address = %admin_addr, "Admin API starting");
                Some(tokio::spawn(async move {
                    axum::serve(admin_listener, admin_app)
                        .with_graceful_shutdown(wait_for(admin_shutdown))
                        .await
                }))
            }
            None => None,
        };

        let reload_task = {
            let routes = self.resolver.routes().clone();
            let mut seeded = self.seeded.clone();
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(next) = config_updates.recv() => {
                            seeded = reseed(&routes, &seeded, &next.routes);
                            tracing::info!(routes = seeded.len(), total = routes.len(), "Config routes reloaded");
                        }
                        _ = stop.recv() => break,
                    }
                }
            })
        };

        let app = self.app();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown.subscribe()))
            .await?;

        if let Some(task) = admin_task {
            match task.await {
                Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
                Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
                Ok(Ok(())) => tracing::info!("Admin API stopped"),
            }
        }
        let _ = reload_task.await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
}

/// Replace `previous` config routes with `routes` in one table update.
/// Invalid definitions are skipped.
fn reseed(table: &HandlerTable, previous: &[SeededRoute], routes: &[RouteConfig]) -> Vec<SeededRoute> {
    table.update(|set| {
        for old in previous {
            set.remove(old.method.clone(), &old.path, &old.domain);
        }

        let mut seeded = Vec::with_capacity(routes.len());
        for (index, route) in routes.iter().enumerate() {
            let parsed = match parse_route(route) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    tracing::warn!(index, %reason, "Skipping invalid config route");
                    continue;
                }
            };

            let domain = parsed.domain.to_string();
            let added = set.add(
                parsed.method.clone(),
                &parsed.path,
                boxed(parsed.response),
                &domain,
                AddOptions::default(),
            );
            match added {
                Ok(()) => seeded.push(SeededRoute {
                    method: parsed.method,
                    path: parsed.path,
                    domain,
                }),
                Err(e) => tracing::warn!(index, error = %e, "Skipping config route"),
            }
        }
        seeded
    })
}
