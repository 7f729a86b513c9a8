// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::PathBuf;

use modelops_pipeline::config::{ConfigError, EnvironmentConfig};
use tempfile::tempdir;

const SAMPLE: &str = r#"
dev:
  model_source: local
  model_local_dir: artifacts/models
  app_port: 8080
  debug: true
  disk_free_threshold: 20
  service_name: model-api

prod:
  model_source: remote
  model_s3_bucket: models-prod
  model_s3_prefix: releases/
  app_port: 443
  debug: false
  disk_free_threshold: 15
  service_name: model-api
"#;

fn write_sample(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("env.yaml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn loads_the_selected_environment_section() {
    let (_dir, path) = write_sample(SAMPLE);
    let cfg = EnvironmentConfig::load(Some("prod"), Some(&path)).unwrap();
    assert_eq!(cfg.model_source, "remote");
    assert_eq!(cfg.model_s3_bucket.as_deref(), Some("models-prod"));
    assert_eq!(cfg.app_port, 443);
    // Keys the section does not set keep their defaults.
    assert_eq!(cfg.model_suffix, ".pkl");
    assert_eq!(cfg.report_dir, PathBuf::from("reports"));
}

#[test]
fn unknown_environment_lists_the_available_ones() {
    let (_dir, path) = write_sample(SAMPLE);
    let err = EnvironmentConfig::load(Some("staging"), Some(&path)).unwrap_err();
    match err {
        ConfigError::EnvironmentNotDefined {
            name, available, ..
        } => {
            assert_eq!(name, "staging");
            assert_eq!(available, vec!["dev".to_string(), "prod".to_string()]);
        }
        other => panic!("expected EnvironmentNotDefined, got {other:?}"),
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.yaml");
    let err = EnvironmentConfig::load(Some("dev"), Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn invalid_yaml_is_a_parse_error() {
    let (_dir, path) = write_sample("dev: [unclosed");
    let err = EnvironmentConfig::load(Some("dev"), Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn explicit_argument_wins_over_defaults() {
    assert_eq!(EnvironmentConfig::resolve_environment(Some("prod")), "prod");
    assert_eq!(
        EnvironmentConfig::resolve_path(Some(std::path::Path::new("custom.yaml"))),
        PathBuf::from("custom.yaml")
    );
}

#[test]
fn complete_section_has_no_missing_required_keys() {
    let (_dir, path) = write_sample(SAMPLE);
    let missing = EnvironmentConfig::missing_required_keys("dev", Some(&path)).unwrap();
    assert!(missing.is_empty(), "unexpected missing keys: {missing:?}");
}

#[test]
fn sparse_section_reports_its_missing_required_keys() {
    let (_dir, path) = write_sample("dev:\n  app_port: 8080\n");
    let missing = EnvironmentConfig::missing_required_keys("dev", Some(&path)).unwrap();
    assert_eq!(
        missing,
        vec![
            "debug".to_string(),
            "disk_free_threshold".to_string(),
            "service_name".to_string()
        ]
    );
}

#[test]
fn out_of_range_values_fail_validation() {
    let (_dir, path) = write_sample("dev:\n  disk_free_threshold: 150\n");
    let cfg = EnvironmentConfig::load(Some("dev"), Some(&path)).unwrap();
    assert!(cfg.validate_values().is_err());
}
