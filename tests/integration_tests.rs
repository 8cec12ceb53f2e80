//! Integration tests for the curlish crate.
//!
//! These tests drive the default reqwest transport against a local mock
//! server. The blocking client runs on a blocking task so that the server
//! keeps serving meanwhile.

use curlish::transport::codes;
use curlish::{Client, ClientBuilder, Error};
use std::fs;
use std::time::Duration;
use wiremock::matchers::{
    body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::helpers::*;

/// Runs `f` on a blocking task.
async fn blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_with_query_parameters() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Result", "found")
                .set_body_string("results"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/search?q=rust+lang", server.uri());
    let response = blocking(move || Client::new().get(&url, [("page", "2")]))
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.status_text(), "OK");
    assert_eq!(response.header("x-result"), Some("found"));
    assert_eq!(response.text(), "results");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains(r#"{"name":"widget","size":"3"}"#))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;

    let url = format!("{}/items", server.uri());
    let response = blocking(move || {
        let mut client = ClientBuilder::new()
            .header("Content-Type", "application/json")
            .build()?;
        client.post(&url, [("name", "widget"), ("size", "3")])
    })
    .await
    .unwrap();

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.status_text(), "Created");
    assert_eq!(response.to_string(), "created");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_head_has_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Size", "42"))
        .mount(&server)
        .await;

    let url = format!("{}/file", server.uri());
    let response = blocking(move || Client::new().head(&url, ())).await.unwrap();

    assert_eq!(response.header("x-size"), Some("42"));
    assert!(response.body().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirect_is_followed_and_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("arrived"))
        .mount(&server)
        .await;

    let url = format!("{}/old", server.uri());
    let (response, effective_url) = blocking(move || {
        let mut client = Client::new();
        let response = client.get(&url, ())?;
        let effective_url = client
            .last_request()
            .map(|snapshot| snapshot.diagnostics.effective_url.clone())
            .unwrap_or_default();
        Ok::<_, Error>((response, effective_url))
    })
    .await
    .unwrap();

    assert_eq!(response.redirect_count(), 1);
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "arrived");
    assert!(effective_url.ends_with("/new"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirect_not_followed_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;

    let url = format!("{}/old", server.uri());
    let response = blocking(move || {
        ClientBuilder::new().follow_redirects(false).build()?.get(&url, ())
    })
    .await
    .unwrap();

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.redirect_count(), 0);
    assert_eq!(response.header("location"), Some("/new"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cookie_file_persists_between_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "session=abc; Path=/; HttpOnly"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let jar_dir = dir.path().to_path_buf();
    let base = server.uri();
    let (login, me) = blocking(move || {
        let mut client = Client::new();
        client.set_cookie_storage(&jar_dir, None)?;
        let login = client.get(&format!("{base}/login"), ())?;
        let me = client.get(&format!("{base}/me"), ())?;
        Ok::<_, Error>((login, me))
    })
    .await
    .unwrap();

    assert_eq!(login.cookie("session"), Some("abc"));
    assert!(login.find_cookie("session").unwrap().http_only);
    assert_eq!(me.status_code(), 200);
    assert_eq!(me.text(), "welcome");

    let stored = fs::read_to_string(dir.path().join("CookieCurl.txt")).unwrap();
    assert!(stored.starts_with("# Netscape HTTP Cookie File"));
    assert!(stored.contains("session\tabc"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_cookies_and_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("cookie", "theme=dark"))
        .and(header("authorization", "Basic amFuZTpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let url = format!("{}/private", server.uri());
    let response = blocking(move || {
        let mut client = Client::new();
        client.set_cookie("theme", "dark")?.set_auth("jane", Some("secret"))?;
        client.get(&url, ())
    })
    .await
    .unwrap();

    assert_eq!(response.status_code(), 204);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"title\""))
        .and(body_string_contains("quarterly numbers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let file = create_temp_file(dir.path(), "report.txt", b"quarterly numbers");
    let url = format!("{}/upload", server.uri());
    let response = blocking(move || {
        let mut client = Client::new();
        client.add_file("report", &file)?;
        client.post(&url, [("title", "Q1")])
    })
    .await
    .unwrap();

    assert_eq!(response.text(), "stored");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_trace_is_captured() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/doc", server.uri());
    let sent = blocking(move || {
        let mut client = Client::new();
        client.set_header("X-Request-Id", "r-1")?;
        client.put(&url, "payload")?;
        Ok::<_, Error>(client.last_request().map(|snapshot| snapshot.request_headers.clone()))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(sent.get("Request-Method").map(String::as_str), Some("PUT"));
    assert_eq!(sent.get("x-request-id").map(String::as_str), Some("r-1"));
    assert!(sent.contains("host"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let url = format!("{}/slow", server.uri());
    let err = blocking(move || {
        let mut client = Client::new();
        client.set_timeout(Duration::from_millis(250), None)?;
        client.get(&url, ())
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport { code: codes::OPERATION_TIMEDOUT, .. }
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let err = blocking(|| Client::new().get("http://127.0.0.1:1/", ()))
        .await
        .unwrap_err();

    match err {
        Error::Transport { code, name, .. } => {
            assert_eq!(code, codes::COULDNT_CONNECT);
            assert_eq!(name, "CURLE_COULDNT_CONNECT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_url_is_transport_error() {
    let err = blocking(|| Client::new().get("not a url", ())).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Transport { code: codes::URL_MALFORMAT, .. }
    ));
}
