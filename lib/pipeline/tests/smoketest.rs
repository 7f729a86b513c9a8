// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use modelops_pipeline::config::EnvironmentConfig;
use modelops_pipeline::smoketest::{self, SmokeError};
use tempfile::tempdir;

fn smoke_config(root: &Path) -> EnvironmentConfig {
    let mut cfg = EnvironmentConfig::default();
    cfg.model_current_symlink = root.join("current_model.pkl");
    cfg.report_dir = root.join("reports");
    cfg
}

#[test]
fn missing_reference_is_detected() {
    let root = tempdir().unwrap();
    let cfg = smoke_config(root.path());

    let err = smoketest::verify(&cfg, "dev").unwrap_err();
    assert!(matches!(err, SmokeError::ReferenceMissing(_)));
}

#[test]
fn dangling_reference_is_detected() {
    let root = tempdir().unwrap();
    let cfg = smoke_config(root.path());

    let model = root.path().join("model_v1.pkl");
    fs::write(&model, b"weights").unwrap();
    std::os::unix::fs::symlink(&model, &cfg.model_current_symlink).unwrap();
    fs::remove_file(&model).unwrap();

    let err = smoketest::verify(&cfg, "dev").unwrap_err();
    match err {
        SmokeError::Dangling { target, .. } => assert_eq!(target, model),
        other => panic!("expected Dangling, got {other:?}"),
    }
}

#[test]
fn directory_target_is_not_a_model() {
    let root = tempdir().unwrap();
    let cfg = smoke_config(root.path());

    let dir_target = root.path().join("model_dir.pkl");
    fs::create_dir(&dir_target).unwrap();
    std::os::unix::fs::symlink(&dir_target, &cfg.model_current_symlink).unwrap();

    let err = smoketest::verify(&cfg, "dev").unwrap_err();
    assert!(matches!(err, SmokeError::NotRegularFile { .. }));
}

#[test]
fn healthy_reference_produces_a_persisted_record() {
    let root = tempdir().unwrap();
    let cfg = smoke_config(root.path());

    let model = root.path().join("model_v1.pkl");
    fs::write(&model, b"weights").unwrap();
    std::os::unix::fs::symlink(&model, &cfg.model_current_symlink).unwrap();

    let record = smoketest::verify(&cfg, "prod").unwrap();
    assert_eq!(record.environment, "prod");
    assert_eq!(record.status, "ok");
    assert_eq!(record.size_bytes, b"weights".len() as u64);
    assert_eq!(record.resolved_path, model.canonicalize().unwrap());

    // The summary is on disk and loads back.
    let loaded = smoketest::load_summary(&cfg.report_dir).unwrap().unwrap();
    assert_eq!(loaded.environment, "prod");
    assert_eq!(loaded.size_bytes, record.size_bytes);
}

#[test]
fn load_summary_is_none_before_any_run() {
    let root = tempdir().unwrap();
    assert!(smoketest::load_summary(&root.path().join("reports"))
        .unwrap()
        .is_none());
}
