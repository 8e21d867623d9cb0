//! Integration tests for `HyperTransport` using wiremock.

use std::time::Duration;

use herald::{Error, HyperTransport, Method, Request, Transport};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, method, path, query_param},
};

fn url(server: &MockServer, path: &str) -> url::Url {
    url::Url::parse(&format!("{}{path}", server.uri())).expect("url")
}

#[tokio::test]
async fn test_get_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/articles/1"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1}"#))
        .mount(&mock_server)
        .await;

    let transport = HyperTransport::new();
    let request = Request::builder(Method::Get, url(&mock_server, "/articles/1"))
        .header("Accept", "application/json")
        .build();

    let response = transport.execute(request).await.expect("response");

    assert!(response.is_success());
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().expect("utf-8"), r#"{"id":1}"#);
}

#[tokio::test]
async fn test_post_request_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/articles"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"title":"Hello"}"#))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "/articles/42"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = HyperTransport::new();
    let request = Request::builder(Method::Post, url(&mock_server, "/articles"))
        .header("Content-Type", "application/json")
        .body(r#"{"title":"Hello"}"#)
        .build();

    let response = transport.execute(request).await.expect("response");

    assert_eq!(response.status(), 201);
    assert_eq!(response.header("location"), Some("/articles/42"));
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let request = Request::builder(Method::Get, url(&mock_server, "/search"))
        .query("q", "rust")
        .build();

    let response = HyperTransport::new()
        .execute(request)
        .await
        .expect("response");
    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_error_statuses_are_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&mock_server)
        .await;

    let request = Request::builder(Method::Delete, url(&mock_server, "/articles/9")).build();
    let response = HyperTransport::new()
        .execute(request)
        .await
        .expect("response");

    assert!(response.is_client_error());
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let transport = HyperTransport::builder()
        .timeout(Duration::from_millis(50))
        .build();
    let request = Request::builder(Method::Get, url(&mock_server, "/slow")).build();

    let err = transport.execute(request).await.expect_err("timeout");
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused() {
    let transport = HyperTransport::new();
    let request = Request::builder(
        Method::Get,
        url::Url::parse("http://127.0.0.1:1/").expect("url"),
    )
    .build();

    let err = transport.execute(request).await.expect_err("refused");
    assert!(matches!(err, Error::Connection(_)));
}
