use crate::client::{plugin_fn, Extension, Namespace};
use crate::plugins::jsonapi::{json_api_options, json_api_url, JsonApiError};
use crate::plugins::verification::{Verification, VerificationExt};
use crate::plugins::{consumers, json_api, verification};
use crate::protocol::constants::DEFAULT_AGENT;
use crate::{
    BuildError, Client, ClientConfig, ClientError, RequestDescriptor, RequestOptions, ResponseData,
    Transport, TransportError, TransportRequest, TransportResponse, UrlOptions, REQUEST_HOOK,
};
use async_trait::async_trait;
use mockito::Matcher;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn client_for(server: &mockito::ServerGuard) -> Client {
    init_tracing();
    assert_ok!(Client::new(ClientConfig::new(server.url())))
}

struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Network("Network Error".to_string()))
    }
}

#[tokio::test]
async fn test_get_json() {
    let mut server = mockito::Server::new_async().await;
    let fixture = json!({ "data": { "id": "1", "type": "node--article" } });
    let mock = server
        .mock("GET", "/node/1")
        .match_header("user-agent", DEFAULT_AGENT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-drupal-cache", "HIT")
        .with_body(fixture.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.request("/node/1", RequestOptions::get()).await);

    assert_eq!(response.status, 200);
    assert_eq!(response.data, ResponseData::Json(fixture));
    assert_eq!(response.headers.get("X-Drupal-Cache"), Some("HIT"));
    assert_eq!(response.url, format!("{}/node/1", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_serializes_json_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/entity")
        .match_header("x-custom", "yes")
        .match_body(Matcher::Json(json!({ "title": "Hello", "tags": [1, 2] })))
        .with_status(201)
        .with_header("content-type", "text/plain")
        .with_body("created")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = assert_ok!(
        client
            .request(
                "entity",
                RequestOptions::post()
                    .header("X-Custom", "yes")
                    .json(json!({ "title": "Hello", "tags": [1, 2] })),
            )
            .await
    );

    assert_eq!(response.status, 201);
    assert_eq!(response.data.as_text(), Some("created"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_content() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/node/1")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.request("/node/1", RequestOptions::delete()).await);
    assert_eq!(response.status, 204);
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_http_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Not found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let error = assert_err!(client.request("/missing", RequestOptions::get()).await);

    assert_eq!(error.status_code(), 404);
    assert_eq!(error.message(), "Not found");
    let response = error.response().unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.data, ResponseData::Json(json!({ "message": "Not found" })));
    assert_eq!(error.errors(), Some(&[json!({ "message": "Not found" })][..]));
}

#[tokio::test]
async fn test_locale_segment() {
    let mut server = mockito::Server::new_async().await;
    let localized = server
        .mock("GET", "/en/node")
        .with_status(200)
        .with_body("en")
        .create_async()
        .await;
    let default = server
        .mock("GET", "/node")
        .with_status(200)
        .with_body("de")
        .create_async()
        .await;

    let client = assert_ok!(Client::new(
        ClientConfig::new(server.url())
            .with_locale("en")
            .with_default_locale("de"),
    ));

    let response = assert_ok!(client.request("node", RequestOptions::get()).await);
    assert_eq!(response.data.as_text(), Some("en"));

    let response = assert_ok!(client.request("node", RequestOptions::get().locale("de")).await);
    assert_eq!(response.data.as_text(), Some("de"));

    localized.assert_async().await;
    default.assert_async().await;
}

#[tokio::test]
async fn test_stored_auth_and_redaction() {
    let mut server = mockito::Server::new_async().await;
    let authorized = server
        .mock("GET", "/private")
        .match_header("authorization", "Bearer secret-token")
        .with_status(403)
        .with_header("content-type", "text/plain")
        .with_body("Forbidden")
        .create_async()
        .await;

    let client = assert_ok!(Client::new(
        ClientConfig::new(server.url()).with_auth("Bearer secret-token"),
    ));
    let error = assert_err!(client.request("/private", RequestOptions::get()).await);

    assert_eq!(error.message(), "Forbidden");
    assert_eq!(error.request().header("authorization"), Some("Bearer [REDACTED]"));
    authorized.assert_async().await;
}

#[tokio::test]
async fn test_unauthenticated_strips_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/public")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .create_async()
        .await;

    let client = assert_ok!(Client::new(ClientConfig::new(server.url()).with_auth("Bearer t")));
    assert_ok!(
        client
            .request(
                "/public",
                RequestOptions::get()
                    .header("Authorization", "Bearer explicit")
                    .unauthenticated(),
            )
            .await
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_explicit_authorization_wins() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/me")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .create_async()
        .await;

    let client = assert_ok!(Client::new(ClientConfig::new(server.url()).with_auth("Bearer t")));
    assert_ok!(
        client
            .request("/me", RequestOptions::get().header("Authorization", "Basic dXNlcjpwYXNz"))
            .await
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transport_failure() {
    init_tracing();
    let client = assert_ok!(Client::new(
        ClientConfig::new("https://cms.example.com").with_transport(Arc::new(FailingTransport)),
    ));

    let error = assert_err!(client.request("/node", RequestOptions::get()).await);
    assert_eq!(error.message(), "Network Error");
    assert_eq!(error.status_code(), 500);
    assert!(error.response().is_none());
    assert_eq!(error.request().url, "https://cms.example.com/node");
}

#[tokio::test]
async fn test_before_hooks_run_in_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/ordered")
        .match_header("x-order", "second")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .hook()
        .before(REQUEST_HOOK, |mut request: RequestDescriptor| async move {
            request.headers.insert("X-Order", "first");
            Ok(request)
        })
        .before(REQUEST_HOOK, |mut request: RequestDescriptor| async move {
            assert_eq!(request.header("x-order"), Some("first"));
            request.headers.insert("x-order", "second");
            Ok(request)
        });

    assert_ok!(client.request("/ordered", RequestOptions::get()).await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_before_hook_can_rewrite_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rewritten")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .hook()
        .before(REQUEST_HOOK, |mut request: RequestDescriptor| async move {
            request.url = format!("{}/rewritten", request.base_url);
            Ok(request)
        });

    assert_ok!(client.request("/original", RequestOptions::get()).await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_after_hook_failure_fails_request() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/node")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    client.hook().after(REQUEST_HOOK, |response, request: RequestDescriptor| async move {
        Err(ClientError::new(
            format!("rejected {}", response.status),
            500,
            &request,
            Some(response),
        ))
    });

    let error = assert_err!(client.request("/node", RequestOptions::get()).await);
    assert_eq!(error.message(), "rejected 200");
}

#[tokio::test]
async fn test_error_hook_recovers() {
    init_tracing();
    let client = assert_ok!(Client::new(
        ClientConfig::new("https://cms.example.com").with_transport(Arc::new(FailingTransport)),
    ));
    client.hook().error(REQUEST_HOOK, |error: ClientError| async move {
        crate::Rescue::Recover(crate::Response {
            status: 200,
            url: error.request().url.clone(),
            headers: crate::Headers::new(),
            data: ResponseData::Text("offline copy".to_string()),
        })
    });

    let response = assert_ok!(client.request("/node", RequestOptions::get()).await);
    assert_eq!(response.data.as_text(), Some("offline copy"));
}

#[test]
fn test_plugin_namespaces_merge() {
    let first = plugin_fn("first", |_, _| {
        Ok(Some(Namespace::from([(
            "shared".to_string(),
            Extension::Map(Namespace::from([("a".to_string(), Extension::from(json!(1)))])),
        )])))
    });
    let second = plugin_fn("second", |_, _| {
        Ok(Some(Namespace::from([(
            "shared".to_string(),
            Extension::Map(Namespace::from([("b".to_string(), Extension::from(json!(2)))])),
        )])))
    });

    let factory = Client::with_plugins([first, second]);
    let client = assert_ok!(factory.build(ClientConfig::new("https://x")));
    let shared = client.namespace("shared").unwrap();
    assert_eq!(shared.len(), 2);
    assert_eq!(client.extension_value("shared", "a"), Some(json!(1)));
    assert_eq!(client.extension_value("shared", "b"), Some(json!(2)));
}

#[test]
fn test_plugin_applied_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let plugin = plugin_fn("counted", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    });

    let factory = Client::plugin(plugin.clone()).plugin(plugin.clone());
    let factory = factory.with_plugins([plugin]);
    assert_eq!(factory.len(), 1);

    assert_ok!(factory.build(ClientConfig::new("https://x")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_plugins_see_earlier_config_changes() {
    let writer = plugin_fn("writer", |_, config| {
        config.options.insert("from_writer".into(), json!("hello"));
        Ok(None)
    });
    let reader = plugin_fn("reader", |_, config| {
        let value = config.option("from_writer").cloned().unwrap_or_default();
        Ok(Some(Namespace::from([("seen".to_string(), Extension::from(value))])))
    });

    let factory = Client::with_plugins([writer, reader]);
    let client = assert_ok!(factory.build(ClientConfig::new("https://x")));
    assert_eq!(
        client.extension("seen").and_then(|e| e.as_value().cloned()),
        Some(json!("hello"))
    );
}

#[test]
fn test_plugin_failure_aborts_build() {
    let broken = plugin_fn("broken", |_, _| Err(anyhow::anyhow!("missing option")));
    let error = assert_err!(Client::plugin(broken).build(ClientConfig::new("https://x")));

    match error {
        BuildError::Plugin { plugin, source } => {
            assert_eq!(plugin, "broken");
            assert_eq!(source.to_string(), "missing option");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_json_api_errors_reclassified() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/jsonapi/node/article")
        .match_header("content-type", "application/vnd.api+json")
        .with_status(422)
        .with_header("content-type", "application/vnd.api+json")
        .with_body(
            json!({
                "errors": [{
                    "title": "Unprocessable Entity",
                    "status": "422",
                    "detail": "title: This value should not be null.",
                    "source": { "pointer": "/data/attributes/title" }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    init_tracing();
    let client = assert_ok!(Client::plugin(json_api()).build(ClientConfig::new(server.url())));
    let url = json_api_url(&client, "node/article", &UrlOptions::new());
    let error = assert_err!(
        client
            .request(
                &url,
                json_api_options(http::Method::POST)
                    .json(json!({ "data": { "type": "node--article" } })),
            )
            .await
    );

    assert!(error.is_structured_error());
    assert_eq!(error.message(), "title: This value should not be null.");
    let details = JsonApiError::of(&error).unwrap();
    assert!(details.has_validation_errors());
    assert_eq!(details.invalid_fields(), vec!["title"]);
}

#[tokio::test]
async fn test_verification_applies_to_one_call() {
    let mut server = mockito::Server::new_async().await;
    let verified = server
        .mock("POST", "/user/password")
        .match_header("x-verification-hash", "abc123")
        .with_status(200)
        .create_async()
        .await;
    let plain = server
        .mock("GET", "/user/me")
        .match_header("x-verification-hash", Matcher::Missing)
        .with_status(200)
        .create_async()
        .await;

    init_tracing();
    let client = assert_ok!(Client::plugin(verification()).build(ClientConfig::new(server.url())));

    assert_ok!(
        client
            .request(
                "/user/password",
                RequestOptions::post().verification(Verification::hash("abc123")),
            )
            .await
    );
    assert_ok!(client.request("/user/me", RequestOptions::get()).await);

    verified.assert_async().await;
    plain.assert_async().await;
}

#[tokio::test]
async fn test_consumer_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/node")
        .match_header("x-consumer-id", "9b1deb4d")
        .with_status(200)
        .create_async()
        .await;

    init_tracing();
    let client = assert_ok!(Client::plugin(consumers()).build(
        ClientConfig::new(server.url()).with_option("consumer_id", "9b1deb4d"),
    ));
    assert_ok!(client.request("/node", RequestOptions::get()).await);
    mock.assert_async().await;
}

#[derive(Debug, Deserialize, PartialEq)]
struct Node {
    id: u32,
    title: String,
}

#[tokio::test]
async fn test_request_json() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("GET", "/node/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"title":"Seven"}"#)
        .create_async()
        .await;
    let _bad = server
        .mock("GET", "/node/8")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"eight"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.request_json::<Node>("/node/7", RequestOptions::get()).await);
    assert_eq!(
        response.data,
        Node {
            id: 7,
            title: "Seven".to_string()
        }
    );

    let error = assert_err!(client.request_json::<Node>("/node/8", RequestOptions::get()).await);
    assert_eq!(error.status_code(), 200);
    assert!(error.message().starts_with("failed to decode response"));
    assert!(error.response().is_some());
}

#[tokio::test]
async fn test_binary_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/file.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(vec![0x25u8, 0x50, 0x44, 0x46])
        .create_async()
        .await;

    let client = client_for(&server);
    let response = assert_ok!(client.request("/file.pdf", RequestOptions::get()).await);
    assert_eq!(response.data.as_bytes().map(|b| &b[..]), Some(&b"%PDF"[..]));
}

#[test]
fn test_error_snapshot_does_not_touch_caller_descriptor() {
    let mut request = RequestDescriptor::new(http::Method::GET, "https://x");
    request.headers.insert("Authorization", "Bearer keep-me");
    let error = ClientError::new("boom", 500, &request, None);

    assert_eq!(request.header("authorization"), Some("Bearer keep-me"));
    assert_eq!(error.request().header("authorization"), Some("Bearer [REDACTED]"));
}

#[tokio::test]
async fn test_redirect_policy() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/old")
        .with_status(302)
        .with_header("location", "/new")
        .create_async()
        .await;

    let client = client_for(&server);

    let error = assert_err!(
        client
            .request("/old", RequestOptions::get().redirect(crate::Redirect::Error))
            .await
    );
    assert_eq!(error.status_code(), 500);
    assert_eq!(error.message(), "unexpected redirect to /new");
    assert!(error.response().is_none());

    let response = assert_ok!(
        client
            .request("/old", RequestOptions::get().redirect(crate::Redirect::Manual))
            .await
    );
    assert_eq!(response.status, 302);
    assert_eq!(response.headers.get("location"), Some("/new"));
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_state() {
    let mut server = mockito::Server::new_async().await;
    let verified = server
        .mock("POST", "/user/password")
        .match_header("x-verification-hash", "abc123")
        .match_header("x-call", "verified")
        .with_status(200)
        .create_async()
        .await;
    let plain = server
        .mock("GET", "/user/me")
        .match_header("x-verification-hash", Matcher::Missing)
        .match_header("x-call", "plain")
        .with_status(200)
        .create_async()
        .await;

    init_tracing();
    let client = assert_ok!(Client::plugin(verification()).build(ClientConfig::new(server.url())));

    let (first, second) = tokio::join!(
        client.request(
            "/user/password",
            RequestOptions::post()
                .header("X-Call", "verified")
                .verification(Verification::hash("abc123")),
        ),
        client.request("/user/me", RequestOptions::get().header("X-Call", "plain")),
    );

    assert_ok!(first);
    assert_ok!(second);
    verified.assert_async().await;
    plain.assert_async().await;
}
