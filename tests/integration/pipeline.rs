//! End-to-end runs of the check pipeline over a sample project
//!
//! The Jigsaw service is replaced by a local server answering with a
//! fixed SOAP verdict, so nothing leaves the machine.

use std::fs;

use rexsl::checks::{REQUIRED_PATHS, WEB_XML};
use rexsl::{CheckKind, CheckRegistry, Pipeline, RexslConfig, RexslError};
use serial_test::serial;

use super::helpers::*;

fn pipeline(config: RexslConfig) -> Pipeline {
    Pipeline::from_config(config)
}

#[test]
#[serial]
fn test_valid_project_passes_every_check() {
    let temp = valid_project();
    let (jigsaw, hits) = scripted_server(vec![(200, VALID_SOAP.to_string())]);
    let env = environment(temp.path());

    let report = pipeline(config_with_jigsaw(&jigsaw))
        .run(&env)
        .expect("Pipeline should not abort");

    assert!(report.passed, "failures: {:?}", report.failures());
    let ran: Vec<CheckKind> = report.checks.iter().map(|c| c.check).collect();
    assert_eq!(ran, CheckKind::ALL.to_vec());
    assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn test_every_registered_check_runs_despite_failures() {
    let temp = valid_project();
    let root = temp.path();
    fs::remove_file(root.join(WEB_XML)).expect("Failed to remove web.xml");
    write(root, "src/main/webapp/img/logo.png", "PNG");
    write(root, "src/test/rexsl/scripts/broken.sh", "exit 3\n");

    let mut config = RexslConfig::default();
    config.checks = vec![
        "BinaryFilesCheck".to_string(),
        "FilesStructureCheck".to_string(),
        "WebXmlCheck".to_string(),
        "InContainerScriptsCheck".to_string(),
        "LibrariesCheck".to_string(),
    ];
    let env = environment(root);
    let report = pipeline(config).run(&env).expect("Pipeline should not abort");

    assert!(!report.passed);
    assert_eq!(report.checks.len(), 5);
    let failures = report.failures();
    let failed: Vec<&str> = failures.keys().map(String::as_str).collect();
    assert_eq!(
        failed,
        vec![
            "BinaryFilesCheck",
            "FilesStructureCheck",
            "InContainerScriptsCheck",
            "WebXmlCheck",
        ]
    );
    assert_eq!(
        failures["BinaryFilesCheck"],
        vec!["File src/main/webapp/img/logo.png has incorrect type/extension 'png'"]
    );
    assert!(failures["InContainerScriptsCheck"][0].starts_with("broken.sh:"));
    assert_eq!(report.failed_count(), 4);
}

#[test]
fn test_unknown_check_aborts_and_lists_known_checks() {
    let temp = valid_project();
    let env = environment(temp.path());
    let mut config = RexslConfig::default();
    config.checks = vec!["WebXmlCheck".to_string(), "SpellingCheck".to_string()];

    let err = pipeline(config).run(&env).unwrap_err();
    match err {
        RexslError::UnknownCheck { name, known } => {
            assert_eq!(name, "SpellingCheck");
            assert_eq!(known, CheckRegistry::known());
            for kind in CheckKind::ALL {
                assert!(known.iter().any(|k| k == kind.name()));
            }
        }
        other => panic!("Expected UnknownCheck, got {other}"),
    }
}

#[test]
#[serial]
fn test_scope_limits_scripts_and_pages() {
    let temp = valid_project();
    let root = temp.path();
    write(root, "src/test/rexsl/scripts/broken.sh", "exit 1\n");
    write(root, "src/test/rexsl/xml/about.xml", "<page/>");

    let mut pipeline = pipeline(RexslConfig::default());
    pipeline
        .registry_mut()
        .set_check("XhtmlOutputCheck, InContainerScriptsCheck");
    pipeline.registry_mut().set_scope(r"(home|index)\..*");

    let env = environment(root);
    let report = pipeline.run(&env).expect("Pipeline should not abort");
    assert!(report.passed, "failures: {:?}", report.failures());
    let scripts = &report.checks[1];
    assert_eq!(scripts.check, CheckKind::InContainerScripts);
    assert_eq!(scripts.notes, vec!["1 of 2 script(s) executed"]);
}

#[test]
fn test_config_file_selects_checks() {
    let temp = valid_project();
    write(
        temp.path(),
        "rexsl.toml",
        "checks = [\"rexsl::checks::FilesStructureCheck\", \"WebXmlCheck\"]\n",
    );
    let config = RexslConfig::discover(temp.path()).expect("Config should load");
    let env = environment(temp.path());

    let report = pipeline(config).run(&env).expect("Pipeline should not abort");
    assert!(report.passed);
    let ran: Vec<CheckKind> = report.checks.iter().map(|c| c.check).collect();
    assert_eq!(ran, vec![CheckKind::FilesStructure, CheckKind::WebXml]);
}

#[test]
fn test_missing_structure_names_every_absent_path() {
    let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
    let env = environment(temp.path());
    let mut config = RexslConfig::default();
    config.checks = vec!["FilesStructureCheck".to_string()];

    let report = pipeline(config).run(&env).expect("Pipeline should not abort");
    let diagnostics = &report.checks[0].diagnostics;
    assert_eq!(diagnostics.len(), REQUIRED_PATHS.len());
    for (diagnostic, path) in diagnostics.iter().zip(REQUIRED_PATHS) {
        assert!(diagnostic.contains(path.trim_end_matches('/')), "{diagnostic}");
    }
}

#[test]
#[serial]
fn test_report_serializes_as_json() {
    let temp = valid_project();
    let env = environment(temp.path());
    let mut config = RexslConfig::default();
    config.checks = vec!["LibrariesCheck".to_string()];

    let report = pipeline(config).run(&env).expect("Pipeline should not abort");
    let json = serde_json::to_value(&report).expect("Report should serialize");
    assert_eq!(json["passed"], true);
    assert_eq!(json["checks"][0]["check"], "LibrariesCheck");
    assert!(json["started_at"].is_string());
}
