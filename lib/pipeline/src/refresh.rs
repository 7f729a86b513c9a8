// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The refresh pass: compare the latest available artifact against the
//! version ledger and, when it is new, stage it, repoint the current
//! reference and record the version.
//!
//! Ordering is the safety net: the reference and ledger are only touched
//! after staging completes, and in that order, so no observer ever resolves
//! the reference to a partially transferred artifact. A refresh that finds
//! nothing new performs zero mutating operations.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs4::fs_std::FileExt;

use crate::config::EnvironmentConfig;
use crate::current::CurrentReference;
use crate::ledger::{LedgerError, VersionLedger};
use crate::source::{self, ArtifactSource, LocateError, TransferError};

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("no model artifacts matching '{suffix}' found at {location}")]
    NoArtifactAvailable { location: String, suffix: String },

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("updating current reference: {0}")]
    Repoint(std::io::Error),

    #[error("acquiring refresh lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new artifact was staged and activated.
    Updated(String),

    /// The ledger already names the latest artifact; nothing was written.
    UpToDate(String),
}

impl RefreshOutcome {
    pub fn version(&self) -> &str {
        match self {
            RefreshOutcome::Updated(version) | RefreshOutcome::UpToDate(version) => version,
        }
    }
}

pub struct Refresher {
    config: EnvironmentConfig,
}

impl Refresher {
    pub fn new(config: EnvironmentConfig) -> Refresher {
        Refresher { config }
    }

    /// Run one refresh pass with the source named in the config.
    pub async fn run(&self) -> Result<RefreshOutcome, RefreshError> {
        let source = source::from_config(&self.config).await?;
        self.run_with(source.as_ref()).await
    }

    /// Run one refresh pass against an already-built source.
    pub async fn run_with(
        &self,
        source: &dyn ArtifactSource,
    ) -> Result<RefreshOutcome, RefreshError> {
        let ledger = VersionLedger::new(&self.config.model_version_file);
        let reference = CurrentReference::new(&self.config.model_current_symlink);

        let previous = ledger.read()?;
        tracing::info!(
            previous = previous.as_deref().unwrap_or("<none>"),
            "starting model refresh"
        );

        let Some(latest) = source.locate_latest().await? else {
            return Err(RefreshError::NoArtifactAvailable {
                location: self.location_label(),
                suffix: self.config.model_suffix.clone(),
            });
        };

        if previous.as_deref() == Some(latest.identifier.as_str()) {
            tracing::info!(version = %latest.identifier, "model already up to date");
            return Ok(RefreshOutcome::UpToDate(latest.identifier));
        }

        // Single-writer guard around stage/repoint/record. A concurrent
        // refresher queues here; the lock is released when the handle drops,
        // including on an abrupt exit of the holder.
        let _lock = self.acquire_lock()?;

        let staged = source
            .stage(&latest, &self.config.model_local_dir)
            .await?;
        let target = reference.repoint(&staged).map_err(RefreshError::Repoint)?;
        ledger.write(&latest.identifier)?;

        tracing::info!(
            version = %latest.identifier,
            target = %target.display(),
            "model updated"
        );
        Ok(RefreshOutcome::Updated(latest.identifier))
    }

    /// The lock lives beside the ledger so every refresher for the same
    /// deployment agrees on it.
    fn lock_path(&self) -> PathBuf {
        self.config
            .model_version_file
            .with_file_name(".model_refresh.lock")
    }

    fn acquire_lock(&self) -> Result<File, RefreshError> {
        let path = self.lock_path();
        let lock_err = |source: std::io::Error| RefreshError::Lock {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(lock_err)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(file)
    }

    fn location_label(&self) -> String {
        if self.config.model_source == "remote" {
            format!(
                "s3://{}/{}",
                self.config.model_s3_bucket.as_deref().unwrap_or("<unset>"),
                self.config.model_s3_prefix.as_deref().unwrap_or("")
            )
        } else {
            self.config.model_local_dir.display().to_string()
        }
    }
}
