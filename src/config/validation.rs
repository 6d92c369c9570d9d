//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, route patterns, methods, status codes
//! - Detect duplicate routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::schema::{RouteConfig, RouterConfig};
use crate::http::handler::StaticResponse;
use crate::routing::{DomainPattern, MethodFilter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingApiKey,

    #[error("observability.log_level: unknown level '{0}'")]
    InvalidLogLevel(String),

    #[error("routes[{index}]: {reason}")]
    InvalidRoute { index: usize, reason: String },

    #[error("routes[{index}]: duplicate of {method} {path} on domain '{domain}'")]
    DuplicateRoute {
        index: usize,
        domain: String,
        method: String,
        path: String,
    },
}

/// A route definition converted for insertion into the table.
#[derive(Debug, Clone)]
pub struct ParsedRoute {
    pub domain: DomainPattern,
    pub method: MethodFilter,
    pub path: String,
    pub response: StaticResponse,
}

/// Check and convert one route definition.
pub fn parse_route(route: &RouteConfig) -> Result<ParsedRoute, String> {
    let domain = DomainPattern::parse(&route.domain).map_err(|e| e.to_string())?;
    let method = route
        .method
        .parse::<MethodFilter>()
        .map_err(|e| e.to_string())?;

    if !route.path.starts_with('/') {
        return Err(format!("path '{}' must start with '/'", route.path));
    }
    let status = StatusCode::from_u16(route.status)
        .map_err(|_| format!("invalid status code {}", route.status))?;
    let content_type = HeaderValue::from_str(&route.content_type)
        .map_err(|_| format!("invalid content type '{}'", route.content_type))?;

    Ok(ParsedRoute {
        domain,
        method,
        path: route.path.clone(),
        response: StaticResponse::new(status, content_type, route.body.as_str()),
    })
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.admin.enabled {
        check_address("admin.bind_address", &config.admin.bind_address, &mut errors);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingApiKey);
        }
    }
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        match parse_route(route) {
            Ok(parsed) => {
                let key = (
                    parsed.domain.to_string(),
                    parsed.method.to_string(),
                    parsed.path,
                );
                if !seen.insert(key.clone()) {
                    errors.push(ValidationError::DuplicateRoute {
                        index,
                        domain: key.0,
                        method: key.1,
                        path: key.2,
                    });
                }
            }
            Err(reason) => errors.push(ValidationError::InvalidRoute { index, reason }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
