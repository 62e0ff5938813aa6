//! Integration tests for class conflict detection across archives

use std::collections::BTreeSet;

use rexsl::archive::ConflictDetector;
use rexsl::checks::LibrariesCheck;
use rexsl::fs::FileFinder;
use rexsl::{Check, RexslConfig};
use tempfile::TempDir;

use super::helpers::*;

#[test]
fn test_unique_classes_are_clean() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let lib = temp.path().join("lib");
    jar(temp.path(), "lib/a.jar", &["com/a/One.class", "com/a/Two.class"]);
    jar(temp.path(), "lib/b.jar", &["com/b/Three.class", "META-INF/MANIFEST.MF"]);

    let report = ConflictDetector::new(false)
        .scan_dir(&lib)
        .expect("Scan should succeed");
    assert!(report.is_clean());
    assert_eq!(report.archives, 2);
    assert_eq!(report.classes, 3);
}

#[test]
fn test_conflict_names_both_archives() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let first = jar(temp.path(), "lib/first.jar", &["com/x/Shared.class"]);
    let second = jar(temp.path(), "lib/second.jar", &["com/x/Shared.class", "com/x/Own.class"]);

    let report = ConflictDetector::new(false)
        .scan(&[second.clone(), first.clone()])
        .expect("Scan should succeed");

    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.class, "com/x/Shared.class");
    assert_eq!(conflict.first, first);
    assert_eq!(conflict.second, second);
}

#[test]
fn test_repeated_archive_is_configurable() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let only = jar(temp.path(), "lib/only.jar", &["com/x/Once.class"]);

    let lenient = ConflictDetector::new(false)
        .scan(&[only.clone(), only.clone()])
        .expect("Scan should succeed");
    assert!(lenient.is_clean());
    assert_eq!(lenient.repeats.len(), 1);

    let strict = ConflictDetector::new(true)
        .scan(&[only.clone(), only])
        .expect("Scan should succeed");
    assert_eq!(strict.conflicts.len(), 1);
}

#[test]
fn test_libraries_check_reports_conflicts_by_archive_name() {
    let temp = valid_project();
    jar(
        temp.path(),
        "target/webapp/WEB-INF/lib/gamma.jar",
        &["com/example/Alpha.class"],
    );
    let env = environment(temp.path());

    let outcome = LibrariesCheck::from_config(&RexslConfig::default())
        .validate(&env)
        .expect("Check should not abort");

    assert!(!outcome.passed);
    assert_eq!(
        outcome.diagnostics,
        vec!["com/example/Alpha.class: alpha conflicts with gamma"]
    );
}

#[test]
fn test_corrupt_archive_aborts_the_check() {
    let temp = valid_project();
    write(temp.path(), "target/webapp/WEB-INF/lib/broken.jar", "not a zip");
    let env = environment(temp.path());

    let err = LibrariesCheck::from_config(&RexslConfig::default())
        .validate(&env)
        .unwrap_err();
    assert!(err.to_string().contains("broken.jar"), "{err}");
}

#[test]
fn test_finder_orders_are_permutations() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    for name in ["c.jar", "a.jar", "nested/b.jar"] {
        jar(temp.path(), &format!("lib/{name}"), &["X.class"]);
    }
    write(temp.path(), "lib/readme.txt", "ignored");
    let finder = FileFinder::new(temp.path().join("lib"), "jar");

    let ordered = finder.ordered().expect("Listing should succeed");
    let names: Vec<_> = ordered
        .iter()
        .map(|p| p.strip_prefix(temp.path()).expect("Under temp").to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            std::path::PathBuf::from("lib/a.jar"),
            std::path::PathBuf::from("lib/c.jar"),
            std::path::PathBuf::from("lib/nested/b.jar"),
        ]
    );

    let random: BTreeSet<_> = finder.random().expect("Listing should succeed").into_iter().collect();
    let expected: BTreeSet<_> = ordered.into_iter().collect();
    assert_eq!(random, expected);
}
