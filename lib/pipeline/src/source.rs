// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Artifact sources: where candidate model files live and how they are
//! brought onto the local disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::artifact::{Artifact, SourceMode};
use crate::config::EnvironmentConfig;

mod local;
pub use local::LocalSource;
mod s3;
pub use s3::S3Source;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("unsupported model_source: {0}")]
    UnsupportedSourceMode(String),

    #[error("model_source=remote requires '{0}' to be set in the environment config")]
    MissingKey(&'static str),

    #[error("model_source=remote but missing AWS env: {}. Either set these secrets or use model_source=local.", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("listing {location}: {message}")]
    List { location: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("downloading {key}: {message}")]
    Download { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// The most recently modified artifact matching the suffix filter, or
    /// `None` when no candidate exists yet. `None` is a legitimate outcome,
    /// not an error; the caller decides what an empty source means.
    async fn locate_latest(&self) -> Result<Option<Artifact>, LocateError>;

    /// Make `artifact` available under `dest_dir` and return the staged
    /// path. Local artifacts are already in place, so staging is the
    /// identity for them.
    async fn stage(&self, artifact: &Artifact, dest_dir: &Path)
        -> Result<PathBuf, TransferError>;
}

/// Build the source named by `model_source`. Remote preconditions (bucket,
/// prefix, credential variables) are checked here, before any network call.
pub async fn from_config(cfg: &EnvironmentConfig) -> Result<Box<dyn ArtifactSource>, LocateError> {
    match SourceMode::from_config(&cfg.model_source) {
        Some(SourceMode::Local) => Ok(Box::new(LocalSource::new(
            &cfg.model_local_dir,
            &cfg.model_suffix,
        ))),
        Some(SourceMode::Remote) => Ok(Box::new(S3Source::from_config(cfg).await?)),
        None => Err(LocateError::UnsupportedSourceMode(cfg.model_source.clone())),
    }
}
