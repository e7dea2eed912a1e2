//! Pass-through forwarding against live stub upstreams
//!
//! Checks that method, path, query, headers and bodies survive the trip in
//! both directions, minus the framing headers the gateway regenerates.

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde_json::json;
use strangler_integration_tests::{TestGateway, Upstreams, body_string, spawn_stub};
use strangler_routing::MigrationConfig;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn no_migration() -> MigrationConfig {
    MigrationConfig {
        enabled: false,
        target_percent: 0,
    }
}

#[tokio::test]
async fn test_get_reaches_monolith_with_path_and_query() {
    let monolith = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/42"))
        .and(query_param("x", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&monolith)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &other.uri(),
            events: &other.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/users/42?x=1")
        .header("host", "gateway.example:5000")
        .header("content-length", "0")
        .header("authorization", "Bearer token-1")
        .body(Body::empty())
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["id"], 42);

    let received = monolith.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let upstream_req = &received[0];

    // Host is regenerated for the upstream, not copied from the caller
    let host = upstream_req.headers.get("host").unwrap().to_str().unwrap();
    assert_ne!(host, "gateway.example:5000");
    assert!(upstream_req.headers.get("content-length").is_none());
    assert_eq!(
        upstream_req.headers.get("authorization").unwrap(),
        "Bearer token-1"
    );
    // Request ID assigned at the edge travels upstream
    assert!(upstream_req.headers.contains_key("x-request-id"));

    assert!(other.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_body_and_content_type_forwarded() {
    let monolith = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/payments"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"amount": 9.99, "user_id": 7})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("location", "/api/payments/100")
                .set_body_json(json!({"id": 100})),
        )
        .expect(1)
        .mount(&monolith)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/payments")
        .header("content-type", "application/json")
        .body(Body::from(json!({"amount": 9.99, "user_id": 7}).to_string()))
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("location").unwrap(), "/api/payments/100");
}

#[tokio::test]
async fn test_delete_with_declared_body_is_forwarded() {
    let monolith = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/subscriptions/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&monolith)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
    );

    let payload = r#"{"reason":"moved"}"#;
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/subscriptions/3")
        .header("content-type", "application/json")
        .header("content-length", payload.len().to_string())
        .body(Body::from(payload))
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let received = monolith.received_requests().await.unwrap();
    assert_eq!(received[0].body, payload.as_bytes());
    assert_eq!(
        received[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_get_without_body_drops_content_headers() {
    let monolith = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&monolith)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::empty())
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let received = monolith.received_requests().await.unwrap();
    assert!(received[0].headers.get("content-type").is_none());
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_upstream_error_status_passes_through() {
    let events = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/events/movie"))
        .respond_with(
            ResponseTemplate::new(422)
                .append_header("set-cookie", "a=1")
                .append_header("set-cookie", "b=2")
                .set_body_string("invalid event"),
        )
        .mount(&events)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &events.uri(),
            movies: &events.uri(),
            events: &events.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/events/movie")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
    assert_eq!(body_string(response).await, "invalid event");

    let recorded = gateway
        .metrics
        .requests_total
        .with_label_values(&["events", "POST", "422"])
        .get();
    assert_eq!(recorded, 1.0);
}

async fn chunked_created() -> Response {
    let chunks = futures::stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"{\"id\":")),
        Ok(Bytes::from_static(b"77}")),
    ]);

    (
        StatusCode::CREATED,
        [("content-type", "application/json")],
        Body::from_stream(chunks),
    )
        .into_response()
}

#[tokio::test]
async fn test_chunked_response_loses_transfer_encoding() {
    let stub = spawn_stub(Router::new().route("/api/users", get(chunked_created))).await;

    // Sanity: the stub really answers with chunked framing
    let direct = reqwest::get(format!("{}/api/users", stub)).await.unwrap();
    assert_eq!(
        direct.headers().get("transfer-encoding").unwrap(),
        "chunked"
    );

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &stub,
            movies: &stub,
            events: &stub,
        },
        no_migration(),
    );

    let request = Request::builder()
        .uri("/api/users")
        .body(Body::empty())
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get("transfer-encoding").is_none());
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_string(response).await, r#"{"id":77}"#);
}

#[tokio::test]
async fn test_unmatched_path_never_reaches_upstream() {
    let monolith = MockServer::start().await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .uri("/api/reviews/1")
        .body(Body::empty())
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(monolith.received_requests().await.unwrap().is_empty());
    assert_eq!(gateway.metrics.unmatched_requests_total.get(), 1.0);
}

#[tokio::test]
async fn test_hop_by_hop_headers_stay_on_their_hop() {
    let monolith = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("connection", "close, x-upstream-hop")
                .insert_header("x-upstream-hop", "1")
                .insert_header("keep-alive", "timeout=5")
                .insert_header("upgrade", "h2c")
                .insert_header("proxy-authenticate", "Basic realm=\"legacy\"")
                .insert_header("x-user-version", "3")
                .set_body_string("user 5"),
        )
        .mount(&monolith)
        .await;

    let gateway = TestGateway::new(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
    );

    let request = Request::builder()
        .uri("/api/users/5")
        .header("connection", "keep-alive, x-hop")
        .header("x-hop", "secret")
        .header("keep-alive", "timeout=5")
        .header("te", "trailers")
        .header("proxy-authorization", "Basic Zm9vOmJhcg==")
        .header("x-caller", "web")
        .body(Body::empty())
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    for name in [
        "connection",
        "keep-alive",
        "upgrade",
        "proxy-authenticate",
        "x-upstream-hop",
    ] {
        assert!(
            response.headers().get(name).is_none(),
            "{} relayed to caller",
            name
        );
    }
    assert_eq!(response.headers().get("x-user-version").unwrap(), "3");
    assert_eq!(body_string(response).await, "user 5");

    let received = monolith.received_requests().await.unwrap();
    let upstream_headers = &received[0].headers;
    for name in ["x-hop", "keep-alive", "te", "proxy-authorization"] {
        assert!(
            upstream_headers.get(name).is_none(),
            "{} relayed upstream",
            name
        );
    }
    if let Some(connection) = upstream_headers.get("connection") {
        assert!(!connection.to_str().unwrap().contains("x-hop"));
    }
    assert_eq!(upstream_headers.get("x-caller").unwrap(), "web");
}

#[tokio::test]
async fn test_oversized_body_rejected_before_upstream() {
    let monolith = MockServer::start().await;

    let gateway = TestGateway::with_max_body_bytes(
        Upstreams {
            monolith: &monolith.uri(),
            movies: &monolith.uri(),
            events: &monolith.uri(),
        },
        no_migration(),
        16,
    );

    let payload = "x".repeat(64);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/payments")
        .header("content-type", "text/plain")
        .header("content-length", payload.len().to_string())
        .body(Body::from(payload))
        .unwrap();

    let response = gateway.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_string(response).await, "Payload Too Large");
    assert!(monolith.received_requests().await.unwrap().is_empty());

    let recorded = gateway
        .metrics
        .requests_failure
        .with_label_values(&["monolith", "payload_too_large"])
        .get();
    assert_eq!(recorded, 1.0);
}
