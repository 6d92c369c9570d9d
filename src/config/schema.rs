//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::{ANY_DOMAIN, ANY_METHOD};

/// Root configuration for the dynamic router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Built-in middlewares installed at startup.
    pub middleware: MiddlewareConfig,

    /// Routes seeded into the table at startup and on reload.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Built-in middleware toggles. Installed in this order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Assign and echo `x-request-id`.
    pub request_id: bool,

    /// Log every dispatched request.
    pub access_log: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            request_id: true,
            access_log: true,
        }
    }
}

/// A route answered with a fixed response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Domain pattern (exact host or mask such as `*.example.com`).
    #[serde(default = "default_domain")]
    pub domain: String,

    /// HTTP method or `*`.
    #[serde(default = "default_method")]
    pub method: String,

    /// Exact request path.
    pub path: String,

    /// Response status code.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response `Content-Type`.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Response body.
    #[serde(default)]
    pub body: String,
}

impl RouteConfig {
    /// Plain-text `200` route on any domain and method.
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            domain: default_domain(),
            method: default_method(),
            path: path.into(),
            status: default_status(),
            content_type: default_content_type(),
            body: body.into(),
        }
    }
}

fn default_domain() -> String {
    ANY_DOMAIN.to_string()
}

fn default_method() -> String {
    ANY_METHOD.to_string()
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}
