//! End-to-end tests against a live router.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use dynamic_router::config::{RouteConfig, RouterConfig};
use dynamic_router::http::{boxed, StaticResponse};
use dynamic_router::routing::AddOptions;
use reqwest::header::{ALLOW, AUTHORIZATION, HOST};
use serde_json::{json, Value};

mod common;

fn route(domain: &str, method: &str, path: &str, body: &str) -> RouteConfig {
    let mut route = RouteConfig::new(path, body);
    route.domain = domain.into();
    route.method = method.into();
    route
}

#[tokio::test]
async fn test_most_specific_route_wins() {
    let mut config = RouterConfig::default();
    config.routes = vec![
        route("*", "*", "/p", "catch-all"),
        route("*.bar", "*", "/p", "mask"),
        route("foo.bar", "*", "/p", "exact-any"),
        route("foo.bar", "GET", "/p", "exact-get"),
    ];
    let router = common::start_router(config).await;
    let client = common::client();

    let cases = [
        ("foo.bar", "exact-get"),
        ("FOO.bar:8080", "exact-get"),
        ("a.b.bar", "mask"),
        ("example.com", "catch-all"),
    ];
    for (host, expected) in cases {
        let res = client.get(router.url("/p")).header(HOST, host).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.text().await.unwrap(), expected, "host {host}");
    }

    let res = client.post(router.url("/p")).header(HOST, "foo.bar").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "exact-any");

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_runtime_mutations_apply_to_next_request() {
    let router = common::start_router(RouterConfig::default()).await;
    let client = common::client();

    let res = client.get(router.url("/live")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    router
        .resolver
        .routes()
        .add(Method::PUT, "/live", boxed(StaticResponse::text("put")), "*", AddOptions::default())
        .unwrap();

    let res = client.get(router.url("/live")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[ALLOW], "PUT");

    let res = client.put(router.url("/live")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "put");

    router.resolver.middlewares().clear();
    let res = client.put(router.url("/live")).send().await.unwrap();
    assert!(!res.headers().contains_key("x-request-id"));

    assert!(router.resolver.routes().remove(Method::PUT, "/live", "*"));
    let res = client.put(router.url("/live")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_replaces_seeded_routes() {
    let mut config = RouterConfig::default();
    config.routes = vec![route("*", "GET", "/old", "old")];
    let router = common::start_router(config.clone()).await;
    let client = common::client();

    router
        .resolver
        .routes()
        .add_get("/runtime", boxed(StaticResponse::text("runtime")))
        .unwrap();

    config.routes = vec![route("*", "GET", "/new", "new")];
    router.config_tx.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(router.url("/old")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(router.url("/new")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "new");
    let res = client.get(router.url("/runtime")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "runtime");

    router.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_api_drives_live_table() {
    let mut config = RouterConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = "test-key".into();
    let router = common::start_router(config).await;
    let client = common::client();
    let admin = |path: &str| router.admin_url(path);
    assert_ne!(router.admin_addr.map(|a| a.port()), Some(0));

    let res = client.get(admin("status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(admin("routes"))
        .header(AUTHORIZATION, "Bearer test-key")
        .json(&json!({
            "domain": "api.example.com",
            "method": "POST",
            "path": "/orders",
            "status": 201,
            "content_type": "application/json",
            "body": "{\"ok\":true}"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(router.url("/orders"))
        .header(HOST, "api.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));

    let res = client
        .delete(admin("domains/api.example.com"))
        .header(AUTHORIZATION, "Bearer test-key")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "removed": 1 }));

    let res = client
        .post(router.url("/orders"))
        .header(HOST, "api.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    router.shutdown.trigger();
}
