// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::AsyncWriteExt;

use super::{ArtifactSource, LocateError, TransferError};
use crate::artifact::{self, Artifact, SourceMode};
use crate::config::EnvironmentConfig;

/// Credential variables that must all be present for remote mode.
const REQUIRED_AWS_ENV: [&str; 3] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_DEFAULT_REGION",
];

/// Bound on any single S3 operation. A stuck transfer is treated as a
/// transient failure; the whole refresh is re-invoked, not retried in place.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Artifacts listed and downloaded from an S3 bucket/prefix.
pub struct S3Source {
    client: Client,
    bucket: String,
    prefix: String,
    suffix: String,
}

impl S3Source {
    /// Validate remote preconditions and build the client. Fails before any
    /// network call when the bucket, prefix or credential variables are
    /// missing.
    pub async fn from_config(cfg: &EnvironmentConfig) -> Result<S3Source, LocateError> {
        let missing: Vec<&'static str> = REQUIRED_AWS_ENV
            .iter()
            .copied()
            .filter(|key| std::env::var(key).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(LocateError::MissingCredentials(missing));
        }

        let bucket = cfg
            .model_s3_bucket
            .clone()
            .ok_or(LocateError::MissingKey("model_s3_bucket"))?;
        let prefix = cfg
            .model_s3_prefix
            .clone()
            .ok_or(LocateError::MissingKey("model_s3_prefix"))?;

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeouts)
            .load()
            .await;

        Ok(S3Source {
            client: Client::new(&aws_cfg),
            bucket,
            prefix,
            suffix: cfg.model_suffix.clone(),
        })
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.prefix)
    }
}

#[async_trait]
impl ArtifactSource for S3Source {
    async fn locate_latest(&self) -> Result<Option<Artifact>, LocateError> {
        let mut candidates = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| LocateError::List {
                location: self.location(),
                message: err.to_string(),
            })?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                if !key.ends_with(&self.suffix) {
                    continue;
                }
                let last_modified = object
                    .last_modified()
                    .and_then(|t| Utc.timestamp_opt(t.secs(), t.subsec_nanos()).single())
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                candidates.push(Artifact {
                    identifier: key.rsplit('/').next().unwrap_or(key).to_string(),
                    key: key.to_string(),
                    last_modified,
                    size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    origin: SourceMode::Remote,
                });
            }
        }
        Ok(artifact::select_latest(candidates))
    }

    async fn stage(
        &self,
        artifact: &Artifact,
        dest_dir: &Path,
    ) -> Result<PathBuf, TransferError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(&artifact.identifier);
        // Stream into a partial file and rename, so an interrupted transfer
        // never leaves a truncated artifact at the final name.
        let partial = dest_dir.join(format!(".{}.partial", artifact.identifier));

        tracing::info!(
            key = %artifact.key,
            dest = %dest.display(),
            "downloading s3://{}/{}",
            self.bucket,
            artifact.key
        );

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&artifact.key)
            .send()
            .await
            .map_err(|err| TransferError::Download {
                key: artifact.key.clone(),
                message: err.to_string(),
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(&partial).await?;
        let copied = tokio::io::copy(&mut reader, &mut file).await;
        if let Err(err) = copied {
            drop(file);
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(TransferError::Download {
                key: artifact.key.clone(),
                message: err.to_string(),
            });
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, &dest).await?;
        Ok(dest)
    }
}
