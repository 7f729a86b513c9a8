// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Post-refresh smoke test: confirm the current reference resolves to a real
//! model file and persist a small JSON summary for the report step.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnvironmentConfig;
use crate::current::CurrentReference;

/// Filename of the persisted health record, under `report_dir`.
pub const SUMMARY_FILE: &str = "smoketest_summary.json";

#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    #[error("current model reference {} does not exist", .0.display())]
    ReferenceMissing(PathBuf),

    #[error("current model reference {} dangles: {} does not exist", .link.display(), .target.display())]
    Dangling { link: PathBuf, target: PathBuf },

    #[error("current model reference {} resolves to {}, which is not a regular file", .link.display(), .target.display())]
    NotRegularFile { link: PathBuf, target: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("encoding health record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Snapshot of one smoke-test pass. Written once per invocation; consumed by
/// report generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub environment: String,
    pub timestamp: String,
    pub reference_path: PathBuf,
    pub resolved_path: PathBuf,
    pub size_bytes: u64,
    pub status: String,
}

/// Verify the current reference and persist the health record under
/// `report_dir`. A missing, dangling or wrong-type reference is an error;
/// this step detects broken state, it does not tolerate it.
pub fn verify(cfg: &EnvironmentConfig, environment: &str) -> Result<HealthRecord, SmokeError> {
    let record = inspect(cfg, environment)?;

    fs::create_dir_all(&cfg.report_dir)?;
    let out = cfg.report_dir.join(SUMMARY_FILE);
    fs::write(&out, serde_json::to_string_pretty(&record)?)?;
    tracing::info!(path = %out.display(), "smoke test summary written");

    Ok(record)
}

/// The most recently persisted health record, if a smoke test has run.
pub fn load_summary(report_dir: &Path) -> Result<Option<HealthRecord>, SmokeError> {
    let path = report_dir.join(SUMMARY_FILE);
    match fs::read_to_string(&path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn inspect(cfg: &EnvironmentConfig, environment: &str) -> Result<HealthRecord, SmokeError> {
    let reference = CurrentReference::new(&cfg.model_current_symlink);
    let link = reference.path().to_path_buf();

    // The link itself must exist, dangling or not.
    match fs::symlink_metadata(&link) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(SmokeError::ReferenceMissing(link));
        }
        Err(err) => return Err(err.into()),
    }

    // Following it must land on something real.
    let resolved = match fs::canonicalize(&link) {
        Ok(path) => path,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            let target = reference.target()?.unwrap_or_else(|| link.clone());
            return Err(SmokeError::Dangling { link, target });
        }
        Err(err) => return Err(err.into()),
    };

    let metadata = fs::metadata(&resolved)?;
    if !metadata.is_file() {
        return Err(SmokeError::NotRegularFile {
            link,
            target: resolved,
        });
    }

    Ok(HealthRecord {
        environment: environment.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        reference_path: link,
        resolved_path: resolved,
        size_bytes: metadata.len(),
        status: "ok".to_string(),
    })
}
