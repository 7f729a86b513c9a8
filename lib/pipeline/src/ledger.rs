// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The version ledger: a single-line text file naming the artifact version
//! currently active.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("reading version ledger {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing version ledger {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

/// Reads return `None` until the first refresh writes a version. Writes
/// fully replace the contents: the new value goes to a temp file in the same
/// directory and is renamed into place, so a concurrent reader sees either
/// the old version or the new one, never a partial line.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    path: PathBuf,
}

impl VersionLedger {
    pub fn new(path: impl Into<PathBuf>) -> VersionLedger {
        VersionLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<String>, LedgerError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let version = contents.trim();
                if version.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(version.to_string()))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LedgerError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn write(&self, version: &str) -> Result<(), LedgerError> {
        let write_err = |message: String| LedgerError::Write {
            path: self.path.clone(),
            message,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| write_err(err.to_string()))?;

        let mut tmp =
            NamedTempFile::new_in(parent).map_err(|err| write_err(err.to_string()))?;
        tmp.write_all(version.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|err| write_err(err.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|err| write_err(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let ledger = VersionLedger::new(dir.path().join(".model_version"));
        assert_eq!(ledger.read().unwrap(), None);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempdir().unwrap();
        let ledger = VersionLedger::new(dir.path().join(".model_version"));
        ledger.write("model_v1.pkl").unwrap();
        assert_eq!(ledger.read().unwrap().as_deref(), Some("model_v1.pkl"));
    }

    #[test]
    fn write_replaces_previous_value_entirely() {
        let dir = tempdir().unwrap();
        let ledger = VersionLedger::new(dir.path().join(".model_version"));
        ledger.write("a-very-long-version-name.pkl").unwrap();
        ledger.write("v2.pkl").unwrap();
        let on_disk = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(on_disk, "v2.pkl\n");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let ledger = VersionLedger::new(dir.path().join("nested/deeper/.model_version"));
        ledger.write("v1.pkl").unwrap();
        assert_eq!(ledger.read().unwrap().as_deref(), Some("v1.pkl"));
    }
}
