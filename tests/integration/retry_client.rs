//! Integration tests for the retrying HTTP client over real sockets

use std::net::{Ipv4Addr, TcpListener};
use std::sync::atomic::Ordering;
use std::time::Duration;

use rexsl::config::HttpConfig;
use rexsl::http::{
    ExpectStatus, Failure, HttpError, Part, ReqwestWire, Request, RetryWire, RetryingHttpClient,
    Retrying, Wire,
};

use super::helpers::*;

fn config() -> HttpConfig {
    HttpConfig {
        retry_delay_ms: 0,
        ..HttpConfig::default()
    }
}

#[test]
fn test_status_retried_until_it_matches() {
    let (url, hits) = scripted_server(vec![
        (500, "boom".to_string()),
        (503, "busy".to_string()),
        (200, "ready".to_string()),
    ]);
    let client = RetryingHttpClient::from_config(&config()).expect("Failed to build client");

    let response = client
        .assert_with(&Request::get(&url), &ExpectStatus::new(200).retries(2))
        .expect("Third attempt should pass");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "ready");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_retry_budget_runs_out() {
    let (url, hits) = scripted_server(vec![(500, "boom".to_string())]);
    let client = RetryingHttpClient::from_config(&config()).expect("Failed to build client");

    let err = client
        .assert_with(&Request::get(&url), &Retrying::new(ExpectStatus::new(200), 3))
        .unwrap_err();

    assert!(matches!(err, HttpError::Assertion(_)));
    assert!(err.to_string().contains("500"), "{err}");
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[test]
fn test_failure_policy_never_retries() {
    let (url, hits) = scripted_server(vec![(200, "fine".to_string())]);
    let client = RetryingHttpClient::from_config(&config()).expect("Failed to build client");

    let err = client
        .assert_with(&Request::get(&url), &Failure::new("not expected here"))
        .unwrap_err();

    assert!(err.to_string().contains("not expected here"), "{err}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_refused_connection_is_transport_error() {
    let port = {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("Failed to bind");
        listener.local_addr().expect("Failed to read address").port()
    };
    let wire = RetryWire::new(
        ReqwestWire::new(Some(Duration::from_secs(2))).expect("Failed to build wire"),
        2,
        Duration::ZERO,
    );

    let err = wire
        .send(&Request::get(format!("http://127.0.0.1:{port}/")))
        .unwrap_err();
    assert!(err.is_io(), "{err}");
}

#[test]
fn test_deadline_stops_retries() {
    let (url, hits) = scripted_server(vec![(500, "boom".to_string())]);
    let client = RetryingHttpClient::from_config(&config())
        .expect("Failed to build client")
        .with_deadline(Some(Duration::ZERO));

    let err = client
        .assert_with(&Request::get(&url), &ExpectStatus::new(200).retries(50))
        .unwrap_err();

    assert!(matches!(err, HttpError::Deadline { .. }), "{err}");
    assert!(hits.load(Ordering::SeqCst) < 50);
}

#[test]
fn test_form_post_reaches_server() {
    let (url, hits, requests) = recording_server(vec![(201, "created".to_string())]);
    let client = RetryingHttpClient::from_config(&config()).expect("Failed to build client");
    let request = Request::post(format!("{url}items"))
        .form_param("name", "first item")
        .header("Accept", "text/plain");

    let response = client
        .assert_with(&request, &ExpectStatus::new(201))
        .expect("POST should be accepted");
    assert_eq!(response.text(), "created");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let raw = String::from_utf8_lossy(&requests.lock().expect("Request log")[0]).into_owned();
    assert!(raw.ends_with("\r\n\r\nname=first+item"), "{raw}");
    assert!(raw
        .to_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
}

#[test]
fn test_multipart_part_holding_a_boundary_lookalike_arrives_intact() {
    let (url, _, requests) = recording_server(vec![(200, "ok".to_string())]);
    let client = RetryingHttpClient::from_config(&config()).expect("Failed to build client");
    let css = "a { b: c }\r\n--vV9olNqRj00PC4OIlM7--\r\nbody { color: red }";
    let request = Request::post(url)
        .part(Part::file("file", "file.css", "text/css", css))
        .part(Part::text("output", "soap12"));

    client
        .assert_with(&request, &ExpectStatus::new(200))
        .expect("Upload should be accepted");

    let raw = String::from_utf8_lossy(&requests.lock().expect("Request log")[0]).into_owned();
    let lower = raw.to_lowercase();
    let boundary = lower
        .lines()
        .find_map(|line| line.strip_prefix("content-type: multipart/form-data; boundary="))
        .expect("Multipart content type")
        .trim()
        .to_string();
    assert_ne!(boundary, "vv9olnqrj00pc4oilm7");
    assert!(raw.contains(css), "{raw}");
    assert!(raw.contains("filename=\"file.css\""), "{raw}");
    assert!(raw.contains("name=\"output\"\r\n\r\nsoap12"), "{raw}");
}
