// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ArtifactSource, LocateError, TransferError};
use crate::artifact::{self, Artifact, SourceMode};

/// Artifacts published straight into a local directory.
pub struct LocalSource {
    dir: PathBuf,
    suffix: String,
}

impl LocalSource {
    pub fn new(dir: &Path, suffix: &str) -> LocalSource {
        LocalSource {
            dir: dir.to_path_buf(),
            suffix: suffix.to_string(),
        }
    }
}

#[async_trait]
impl ArtifactSource for LocalSource {
    async fn locate_latest(&self) -> Result<Option<Artifact>, LocateError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            // A directory nobody has published into yet has no candidates.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(&self.suffix) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let last_modified: DateTime<Utc> = metadata.modified()?.into();
            candidates.push(Artifact {
                identifier: name,
                key: entry.path().to_string_lossy().into_owned(),
                last_modified,
                size_bytes: metadata.len(),
                origin: SourceMode::Local,
            });
        }
        Ok(artifact::select_latest(candidates))
    }

    async fn stage(
        &self,
        artifact: &Artifact,
        _dest_dir: &Path,
    ) -> Result<PathBuf, TransferError> {
        // Already on the local disk.
        Ok(PathBuf::from(&artifact.key))
    }
}
