// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The current-model reference: a symlink at a well-known path that always
//! resolves to the active artifact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Replacement creates the new symlink under a temporary name and renames it
/// onto the final path, so an observer sees either the old target or the new
/// one. There is no window where the reference is absent or half-written.
#[derive(Debug, Clone)]
pub struct CurrentReference {
    link: PathBuf,
}

impl CurrentReference {
    pub fn new(link: impl Into<PathBuf>) -> CurrentReference {
        CurrentReference { link: link.into() }
    }

    pub fn path(&self) -> &Path {
        &self.link
    }

    /// The target the link points at, without checking that it exists.
    /// `None` when the link itself is absent.
    pub fn target(&self) -> Result<Option<PathBuf>, std::io::Error> {
        match fs::read_link(&self.link) {
            Ok(target) => Ok(Some(target)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Atomically repoint the reference at `target`. The target is made
    /// absolute first; a relative link would dangle depending on the working
    /// directory of whoever resolves it.
    pub fn repoint(&self, target: &Path) -> Result<PathBuf, std::io::Error> {
        let target_abs = fs::canonicalize(target)?;

        let parent = match self.link.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let file_name = self
            .link
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "current".to_string());
        let staging_link = parent.join(format!(".{file_name}.swap"));

        match fs::remove_file(&staging_link) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        std::os::unix::fs::symlink(&target_abs, &staging_link)?;
        fs::rename(&staging_link, &self.link)?;
        Ok(target_abs)
    }
}
