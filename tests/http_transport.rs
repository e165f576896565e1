use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use rusty_fetch::{
    fetch_all, Dispatcher, FetchOptions, HttpTransport, RequestItem, ResponseBody, TransportOptions,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(options: FetchOptions) -> Dispatcher {
    Dispatcher::new(Arc::new(HttpTransport::new(Client::new())), options)
}

#[tokio::test]
async fn json_and_text_bodies_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "slow"}))
                .set_delay(Duration::from_millis(80)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fast"))
        .mount(&server)
        .await;

    let urls = [format!("{}/slow.json", server.uri()), format!("{}/fast.txt", server.uri())];
    let records = fetch_all(&urls, FetchOptions::new(2)).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, urls[0]);
    assert_eq!(records[0].body, Some(ResponseBody::Json(json!({"name": "slow"}))));
    assert_eq!(records[1].body, Some(ResponseBody::Text("fast".into())));
    assert!(records.iter().all(|r| r.ok && r.status_code == Some(200)));
    assert!(records[0].headers.as_ref().unwrap()["content-type"].contains("application/json"));
}

#[tokio::test]
async fn server_errors_are_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(path("/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&server)
        .await;
    Mock::given(path("/fine"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&server)
        .await;

    let urls = [format!("{}/broken", server.uri()), format!("{}/fine", server.uri())];
    let records = dispatcher(FetchOptions::new(1)).fetch_all(&urls).await.unwrap();

    assert!(!records[0].ok);
    assert_eq!(records[0].status_code, Some(503));
    assert_eq!(records[0].error.as_deref(), Some("HTTP status error: 503"));
    assert_eq!(records[0].body, Some(ResponseBody::Text("try later".into())));
    assert!(records[1].ok);
}

#[tokio::test]
async fn slow_server_times_out_alone() {
    let server = MockServer::start().await;
    Mock::given(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;
    Mock::given(path("/quick"))
        .respond_with(ResponseTemplate::new(200).set_body_string("quick"))
        .mount(&server)
        .await;

    let urls = [format!("{}/hang", server.uri()), format!("{}/quick", server.uri())];
    let records = dispatcher(FetchOptions::new(2).with_timeout_ms(100))
        .fetch_all(&urls)
        .await
        .unwrap();

    assert!(!records[0].ok);
    assert_eq!(records[0].status_code, None);
    assert_eq!(records[0].error.as_deref(), Some("Request timeout after 100 ms"));
    assert!(records[0].elapsed_ms < 800);
    assert!(records[1].ok);
}

#[tokio::test]
async fn method_headers_and_params_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("x-api-key", "secret"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(1)
        .mount(&server)
        .await;

    let batch_defaults = TransportOptions {
        headers: vec![("x-api-key".into(), "secret".into())],
        ..Default::default()
    };
    let create = RequestItem::new(format!("{}/items", server.uri())).with_options(TransportOptions {
        method: Some(Method::POST),
        params: Some(json!({"name": "widget"})),
        ..Default::default()
    });
    let search = RequestItem::new(format!("{}/search", server.uri())).with_options(TransportOptions {
        params: Some(json!({"q": "rust"})),
        ..Default::default()
    });

    let records = dispatcher(FetchOptions::new(2).with_transport(batch_defaults))
        .fetch_requests(vec![create, search])
        .await
        .unwrap();

    assert_eq!(records[0].status_code, Some(201));
    assert_eq!(records[0].body, Some(ResponseBody::Json(json!({"id": 1}))));
    assert_eq!(records[1].body, Some(ResponseBody::Text("found".into())));
}

#[tokio::test]
async fn unreachable_host_is_a_failed_record() {
    let records = dispatcher(FetchOptions::new(1).with_timeout_ms(2_000))
        .fetch_all(&["http://127.0.0.1:1/"])
        .await
        .unwrap();

    assert!(!records[0].ok);
    assert_eq!(records[0].status_code, None);
    assert!(records[0].error.as_deref().unwrap().starts_with("Request error"));
}
