// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::time::{Duration, SystemTime};

use modelops_pipeline::config::EnvironmentConfig;
use modelops_pipeline::{report, smoketest};
use tempfile::tempdir;

#[test]
fn report_without_summary_renders_a_placeholder() {
    let root = tempdir().unwrap();
    let report_dir = root.path().join("reports");

    let path = report::generate(&report_dir, "dev").unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("No smoke test summary found"));
    assert!(html.contains("Environment: <b>dev</b>"));
}

#[test]
fn report_embeds_the_health_record() {
    let root = tempdir().unwrap();
    let mut cfg = EnvironmentConfig::default();
    cfg.model_current_symlink = root.path().join("current_model.pkl");
    cfg.report_dir = root.path().join("reports");

    let model = root.path().join("model_v3.pkl");
    fs::write(&model, b"weights").unwrap();
    std::os::unix::fs::symlink(&model, &cfg.model_current_symlink).unwrap();
    smoketest::verify(&cfg, "prod").unwrap();

    let path = report::generate(&cfg.report_dir, "prod").unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("model_v3.pkl"));
    assert!(html.contains("<td>ok</td>"));
    assert!(html.contains(&b"weights".len().to_string()));
}

#[test]
fn latest_report_is_none_before_any_generation() {
    let root = tempdir().unwrap();
    assert!(report::latest_report(&root.path().join("reports"))
        .unwrap()
        .is_none());
}

#[test]
fn latest_report_picks_the_most_recent_file() {
    let root = tempdir().unwrap();
    let report_dir = root.path().join("reports");
    fs::create_dir_all(&report_dir).unwrap();

    for (name, secs) in [
        ("model_report_20240101_000000.html", 1_000u64),
        ("model_report_20240201_000000.html", 2_000),
        ("unrelated.html", 9_000),
    ] {
        let path = report_dir.join(name);
        fs::write(&path, b"<html></html>").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    let latest = report::latest_report(&report_dir).unwrap().unwrap();
    assert_eq!(
        latest.file_name().unwrap().to_string_lossy(),
        "model_report_20240201_000000.html"
    );
}
