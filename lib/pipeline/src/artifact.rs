// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Candidate model artifacts and the selection rule for "latest".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where model artifacts are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Remote,
    Local,
}

impl SourceMode {
    /// Parse the `model_source` config value. `None` for anything that is
    /// not a supported mode.
    pub fn from_config(value: &str) -> Option<SourceMode> {
        match value {
            "remote" => Some(SourceMode::Remote),
            "local" => Some(SourceMode::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Remote => "remote",
            SourceMode::Local => "local",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate artifact discovered during location. Transient; only the
/// identifier is ever persisted (in the version ledger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Version identifier: the final path component of `key`.
    pub identifier: String,

    /// Full object key (remote) or filesystem path (local).
    pub key: String,

    pub last_modified: DateTime<Utc>,

    pub size_bytes: u64,

    pub origin: SourceMode,
}

impl Artifact {
    /// Newest `last_modified` wins; equal timestamps are broken by the
    /// lexicographically greatest key so repeated runs pick the same winner.
    pub fn is_newer_than(&self, other: &Artifact) -> bool {
        (self.last_modified, self.key.as_str()) > (other.last_modified, other.key.as_str())
    }
}

/// Pick the latest artifact out of `candidates`, or `None` when there are
/// none. Both source backends funnel through this so the tie-break rule
/// lives in exactly one place.
pub fn select_latest(candidates: impl IntoIterator<Item = Artifact>) -> Option<Artifact> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(best) if best.is_newer_than(&candidate) => Some(best),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn artifact(key: &str, secs: i64) -> Artifact {
        Artifact {
            identifier: key.rsplit('/').next().unwrap().to_string(),
            key: key.to_string(),
            last_modified: Utc.timestamp_opt(secs, 0).unwrap(),
            size_bytes: 1,
            origin: SourceMode::Local,
        }
    }

    #[test]
    fn newest_timestamp_wins() {
        let picked = select_latest([artifact("a.pkl", 100), artifact("b.pkl", 200)]).unwrap();
        assert_eq!(picked.identifier, "b.pkl");
    }

    #[test]
    fn equal_timestamps_break_by_greatest_key() {
        let picked = select_latest([artifact("b.pkl", 100), artifact("a.pkl", 100)]).unwrap();
        assert_eq!(picked.identifier, "b.pkl");
        // Same winner regardless of iteration order.
        let picked = select_latest([artifact("a.pkl", 100), artifact("b.pkl", 100)]).unwrap();
        assert_eq!(picked.identifier, "b.pkl");
    }

    #[test]
    fn no_candidates_is_none() {
        assert!(select_latest(Vec::<Artifact>::new()).is_none());
    }
}
