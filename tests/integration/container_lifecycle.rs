//! Integration tests for the embedded container lifecycle
//!
//! These start a real listener on a loopback port, so they run serially.

use std::fs;

use rexsl::checks::InContainerScriptsCheck;
use rexsl::container::{ContainerError, ContainerState, EmbeddedContainer, PARAM_BASEDIR};
use rexsl::http::{ExpectStatus, NoBrokenLinks, ReqwestWire, Request, RetryingHttpClient};
use rexsl::script::ScriptRunner;
use rexsl::RexslConfig;
use reqwest::Url;
use serial_test::serial;

use super::helpers::*;

#[test]
#[serial]
fn test_container_serves_webdir_until_stopped() {
    let temp = valid_project();
    let env = environment(temp.path());
    let container = EmbeddedContainer::new();
    assert_eq!(container.state(), ContainerState::NotStarted);

    container.start(&env).expect("Container should start");
    assert_eq!(container.state(), ContainerState::Running);
    assert_eq!(container.port(), Some(env.port()));
    assert_eq!(
        container.init_params().get(PARAM_BASEDIR).map(String::as_str),
        Some(temp.path().display().to_string().as_str())
    );

    let wire = ReqwestWire::new(None).expect("Failed to build wire");
    let client = RetryingHttpClient::new(&wire);
    let home = format!("http://127.0.0.1:{}/", env.port());
    let page = client
        .assert_with(&Request::get(format!("{home}index.html")), &ExpectStatus::new(200))
        .expect("index.html should be served");
    assert!(page.text().contains("About"));

    let missing = client
        .fetch(&Request::get(format!("{home}nowhere.html")))
        .expect("Container should answer");
    assert_eq!(missing.status(), 404);

    container.stop().expect("Container should stop");
    assert_eq!(container.state(), ContainerState::Stopped);
    assert_eq!(container.stop_count(), 1);
    assert!(client.fetch(&Request::get(home)).is_err());
}

#[test]
#[serial]
fn test_second_start_and_second_stop_are_rejected() {
    let temp = valid_project();
    let env = environment(temp.path());
    let container = EmbeddedContainer::new();

    container.start(&env).expect("Container should start");
    assert!(matches!(
        container.start(&env),
        Err(ContainerError::AlreadyStarted {
            state: ContainerState::Running
        })
    ));
    container.stop().expect("Container should stop");
    assert!(matches!(
        container.stop(),
        Err(ContainerError::NotRunning {
            state: ContainerState::Stopped
        })
    ));
    assert!(matches!(
        container.start(&env),
        Err(ContainerError::AlreadyStarted { .. })
    ));
    assert_eq!(container.stop_count(), 1);
}

#[test]
#[serial]
fn test_missing_webdir_leaves_container_not_started() {
    let temp = valid_project();
    fs::remove_dir_all(temp.path().join("target/webapp")).expect("Failed to remove webdir");
    let env = environment(temp.path());
    let container = EmbeddedContainer::new();

    let err = container.start(&env).unwrap_err();
    assert!(matches!(err, ContainerError::WebdirAbsent { .. }));
    assert_eq!(container.state(), ContainerState::NotStarted);
}

#[test]
#[serial]
fn test_bootstrap_runs_in_order_before_scripts() {
    let temp = valid_project();
    let root = temp.path();
    let log = root.join("trace.log");
    let append = |label: &str| format!("echo {label} >> \"{}\"\n", log.display());
    write(root, "src/test/rexsl/setup/b.sh", &append("B"));
    write(root, "src/test/rexsl/setup/a.sh", &append("A"));
    fs::remove_file(root.join("src/test/rexsl/scripts/home.sh")).expect("Failed to remove script");
    write(root, "src/test/rexsl/scripts/main.sh", &append("S"));

    let env = environment(root);
    let container = EmbeddedContainer::new();
    let outcome = InContainerScriptsCheck::from_config(&RexslConfig::default())
        .validate_in(&env, &container)
        .expect("Check should not abort");

    assert!(outcome.passed, "{:?}", outcome.diagnostics);
    let trace = fs::read_to_string(&log).expect("Failed to read trace");
    assert_eq!(trace, "A\nB\nS\n");
    assert_eq!(container.state(), ContainerState::Stopped);
    assert_eq!(container.stop_count(), 1);
}

#[test]
#[serial]
fn test_bootstrap_is_idempotent() {
    let temp = valid_project();
    let root = temp.path();
    let log = root.join("trace.log");
    write(
        root,
        "src/test/rexsl/setup/seed.sh",
        &format!("echo seeded >> \"{}\"\n", log.display()),
    );

    let env = environment(root);
    let container = EmbeddedContainer::new();
    let runner = ScriptRunner::new(vec!["sh".to_string()]);
    container.start(&env).expect("Container should start");
    assert_eq!(container.bootstrap(&env, &runner, "sh").expect("Bootstrap"), 1);
    assert_eq!(container.bootstrap(&env, &runner, "sh").expect("Bootstrap"), 0);
    container.stop().expect("Container should stop");

    assert_eq!(fs::read_to_string(&log).expect("Failed to read trace"), "seeded\n");
}

#[test]
#[serial]
fn test_no_broken_links_against_served_page() {
    let temp = valid_project();
    let env = environment(temp.path());
    let container = EmbeddedContainer::new();
    container.start(&env).expect("Container should start");

    let home = Url::parse(&format!("http://127.0.0.1:{}/", env.port())).expect("Valid URL");
    let wire = ReqwestWire::new(None).expect("Failed to build wire");
    let client = RetryingHttpClient::new(&wire);
    let healthy = client.assert_with(
        &Request::get(home.join("index.html").expect("Valid URL").as_str()),
        &NoBrokenLinks::new(home.clone(), &wire),
    );

    write(
        temp.path(),
        "target/webapp/broken.html",
        "<html><body><img src=\"/img/missing.png\"/></body></html>",
    );
    let broken = client.assert_with(
        &Request::get(home.join("broken.html").expect("Valid URL").as_str()),
        &NoBrokenLinks::new(home, &wire),
    );
    container.stop().expect("Container should stop");

    assert!(healthy.is_ok(), "{:?}", healthy.err());
    let message = broken.unwrap_err().to_string();
    assert!(message.contains("/img/missing.png"), "{message}");
}
