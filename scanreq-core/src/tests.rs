//! End-to-end test suite for scanreq-core.

use crate::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("scanreq_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(dir.join("project")).unwrap();
    dir
}

fn installed() -> StaticDistributions {
    StaticDistributions::new()
        .with("django", &["Django"])
        .with("requests", &["requests"])
        .with("celery", &["celery"])
        .with("redis", &["redis"])
        .with("yaml", &["PyYAML"])
        .with("black", &["black"])
        .with("_black_version", &["black"])
        .with("gunicorn", &["gunicorn"])
}

fn run(root: &Path, output: Option<&Path>, ignored: &[&str]) -> AnalysisResult {
    let result = Scanreq::new(root.join("requirements.txt"), root.join("project"))
        .ignore_packages(ignored)
        .analyze(&installed())
        .unwrap();
    if let Some(path) = output {
        write_output(path, &result.unused).unwrap();
    }
    result
}

// Unused package appears exactly once, in the set and in the output file
#[test]
fn test_unused_package_reported_once() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "Django==4.2\nredis>=5.0\nredis\n");
    write_file(&root.join("project/app/views.py"), "from django.shortcuts import render\n");

    let output = root.join("unused.txt");
    let result = run(&root, Some(&output), &[]);

    assert_eq!(result.unused, BTreeSet::from(["redis".to_string()]));
    assert_eq!(fs::read_to_string(&output).unwrap(), "redis\n");
}

// Everything used: empty set and no output file
#[test]
fn test_all_used_writes_nothing() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "Django\nrequests  # http\ncelery\n");
    write_file(&root.join("project/manage.py"), "import django\n");
    write_file(&root.join("project/api/client.py"), "import requests\n");
    write_file(&root.join("project/config/worker.yml"), "broker: celery\n");

    let output = root.join("unused.txt");
    let result = run(&root, Some(&output), &[]);

    assert!(!result.has_unused());
    assert!(!output.exists(), "output file must not be created for an empty report");
}

// Default and user-supplied ignores are never reported
#[test]
fn test_ignored_packages_never_reported() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "black==24.1\ncelery\nredis\n");
    write_file(&root.join("project/main.py"), "print('hi')\n");

    let result = run(&root, None, &["Celery"]);

    assert_eq!(result.unused, BTreeSet::from(["redis".to_string()]));
    assert!(result.findings.iter().all(|f| f.package != "black" && f.package != "celery"));
}

// Requirements without an installed distribution are not reported as unused
#[test]
fn test_uninstalled_requirement_is_unresolved() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "flask\nPyYAML\n");
    write_file(&root.join("project/main.py"), "import os\n");

    let result = run(&root, None, &[]);

    assert_eq!(result.unresolved, vec!["flask"]);
    assert_eq!(result.unused, BTreeSet::from(["pyyaml".to_string()]));
}

// Dockerfile and config files count as usage
#[test]
fn test_usage_in_dockerfile() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "gunicorn\n");
    write_file(&root.join("project/Dockerfile"), "CMD [\"gunicorn\", \"app:wsgi\"]\n");

    assert!(!run(&root, None, &[]).has_unused());
}

// Non-UTF-8 files never match and never abort
#[test]
fn test_binary_source_file_is_skipped() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "redis\n");
    fs::write(root.join("project/blob.py"), b"\xffredis\xfe").unwrap();

    let result = run(&root, None, &[]);
    assert_eq!(result.unused, BTreeSet::from(["redis".to_string()]));
}

// A missing manifest is a not-found failure before any scanning
#[test]
fn test_missing_requirements_file() {
    let root = setup_temp_project();
    let err = Scanreq::new(root.join("requirements.txt"), root.join("project"))
        .analyze(&installed())
        .unwrap_err();
    assert!(err
        .downcast_ref::<ScanreqError>()
        .is_some_and(ScanreqError::is_not_found));
}

// Config file settings flow into the scan
#[test]
fn test_project_config_file() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "redis\nrequests\n");
    write_file(
        &root.join("project/scanreq.toml"),
        "ignored-packages = [\"redis\"]\nexclude-dirs = [\"vendor\"]\n",
    );
    write_file(&root.join("project/vendor/lib.py"), "import requests\n");

    let file = load_config(&root.join("project")).unwrap().unwrap();
    let config = ScanConfig::default().merge_file(&file);
    let result = Scanreq::new(root.join("requirements.txt"), root.join("project"))
        .config(config)
        .analyze(&installed())
        .unwrap();

    assert_eq!(result.unused, BTreeSet::from(["requests".to_string()]));
}

// Report lines are numbered in discovery order
#[test]
fn test_report_numbering() {
    let root = setup_temp_project();
    write_file(&root.join("requirements.txt"), "redis\ncelery\n");
    write_file(&root.join("project/main.py"), "\n");

    let result = run(&root, None, &[]);
    let lines: Vec<String> = result.findings.iter().map(format_finding).collect();
    assert!(lines[0].starts_with(" 1.  Module: redis "));
    assert!(lines[1].starts_with(" 2.  Module: celery "));
    assert!(lines[1].ends_with("-> Package: celery"));
}
