// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Per-environment configuration.
//!
//! The config file is a YAML document keyed by environment name. Values for
//! the selected environment are layered on top of the built-in defaults, and
//! `MODELOPS_`-prefixed environment variables win over both, so a CI job can
//! override a single key without editing the file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// ENV used to select the deployment environment
const ENV_VAR: &str = "MODELOPS_ENV";

/// ENV used to override the config file path
const CONFIG_PATH_VAR: &str = "MODELOPS_CONFIG_PATH";

/// Prefix for per-key overrides, e.g. `MODELOPS_APP_PORT=9000`
const OVERRIDE_PREFIX: &str = "MODELOPS_";

const DEFAULT_ENVIRONMENT: &str = "dev";
const DEFAULT_CONFIG_PATH: &str = "configs/env.yaml";

/// Keys every environment section is expected to define for the peripheral
/// pipeline steps. Checked by `modelctl validate-config`.
pub const REQUIRED_KEYS: [&str; 4] = ["app_port", "debug", "disk_free_threshold", "service_name"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("environment '{name}' is not defined in {} (available: {})", .path.display(), .available.join(", "))]
    EnvironmentNotDefined {
        name: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Settings for one deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Where model artifacts come from: `remote` or `local`.
    pub model_source: String,

    /// Staging directory for downloaded / locally published artifacts.
    pub model_local_dir: PathBuf,

    /// Path of the symlink that always points at the active artifact.
    pub model_current_symlink: PathBuf,

    /// Path of the single-line version ledger.
    pub model_version_file: PathBuf,

    /// Filename suffix identifying model artifacts.
    pub model_suffix: String,

    /// Bucket to list, required for `model_source: remote`.
    pub model_s3_bucket: Option<String>,

    /// Key prefix to list under, required for `model_source: remote`.
    pub model_s3_prefix: Option<String>,

    /// Output directory for the health record and rendered reports.
    pub report_dir: PathBuf,

    pub report_email_to: Option<String>,
    pub report_email_from: Option<String>,

    /// Port the serving app binds; probed by `check port`.
    #[validate(range(min = 1))]
    pub app_port: u16,

    /// Minimum acceptable free-disk percentage; probed by `check disk`.
    #[validate(range(min = 0.0, max = 100.0))]
    pub disk_free_threshold: f64,

    /// Process name probed by `check service`.
    pub service_name: Option<String>,

    pub debug: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            model_source: "remote".to_string(),
            model_local_dir: PathBuf::from("artifacts/models"),
            model_current_symlink: PathBuf::from("artifacts/current_model.pkl"),
            model_version_file: PathBuf::from("artifacts/.model_version"),
            model_suffix: ".pkl".to_string(),
            model_s3_bucket: None,
            model_s3_prefix: None,
            report_dir: PathBuf::from("reports"),
            report_email_to: None,
            report_email_from: None,
            app_port: 8080,
            disk_free_threshold: 20.0,
            service_name: None,
            debug: false,
        }
    }
}

impl EnvironmentConfig {
    /// Environment name: explicit argument, then `MODELOPS_ENV`, then `dev`.
    pub fn resolve_environment(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| std::env::var(ENV_VAR).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    /// Config file path: explicit argument, then `MODELOPS_CONFIG_PATH`,
    /// then `configs/env.yaml`.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| {
                std::env::var(CONFIG_PATH_VAR)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load the settings for one environment. Reads the file once; no other
    /// side effects.
    pub fn load(environment: Option<&str>, path: Option<&Path>) -> Result<Self, ConfigError> {
        let name = Self::resolve_environment(environment);
        let path = Self::resolve_path(path);
        let raw = Self::read_raw(&path)?;
        let doc = Self::parse_document(&path, &raw)?;

        if !doc.contains_key(&name) {
            return Err(ConfigError::EnvironmentNotDefined {
                name,
                path,
                available: doc.keys().cloned().collect(),
            });
        }

        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Figment::from(Yaml::string(&raw)).focus(&name))
            .merge(Env::prefixed(OVERRIDE_PREFIX))
            .extract()
            .map_err(|err| ConfigError::Parse {
                path,
                message: err.to_string(),
            })
    }

    /// Field-level validation (port range, threshold bounds).
    pub fn validate_values(&self) -> Result<(), ConfigError> {
        Validate::validate(self).map_err(|err| ConfigError::Invalid {
            message: err.to_string(),
        })
    }

    /// Which of [`REQUIRED_KEYS`] the environment's section does not define
    /// explicitly. Empty means the section is complete.
    pub fn missing_required_keys(
        environment: &str,
        path: Option<&Path>,
    ) -> Result<Vec<String>, ConfigError> {
        let path = Self::resolve_path(path);
        let raw = Self::read_raw(&path)?;
        let doc = Self::parse_document(&path, &raw)?;
        let Some(section) = doc.get(environment) else {
            return Err(ConfigError::EnvironmentNotDefined {
                name: environment.to_string(),
                path,
                available: doc.keys().cloned().collect(),
            });
        };
        Ok(REQUIRED_KEYS
            .iter()
            .filter(|key| section.get(**key).is_none())
            .map(|key| key.to_string())
            .collect())
    }

    fn read_raw(path: &Path) -> Result<String, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(raw),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ConfigError::NotFound(path.to_path_buf()))
            }
            Err(err) => Err(ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    fn parse_document(
        path: &Path,
        raw: &str,
    ) -> Result<BTreeMap<String, serde_yaml::Value>, ConfigError> {
        serde_yaml::from_str(raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}
