// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTML report generation from the latest health record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use minijinja::{context, Environment};

use crate::smoketest::{self, SmokeError};

const REPORT_PREFIX: &str = "model_report_";

const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Model Report - {{ timestamp }}</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 1.5rem; }
    h1 { margin-bottom: 0.2rem; }
    .meta { color: #666; margin-bottom: 1rem; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid #ddd; padding: 0.4rem 0.8rem; text-align: left; }
  </style>
</head>
<body>
  <h1>Model Report</h1>
  <div class="meta">Environment: <b>{{ environment }}</b> | Generated at: <b>{{ timestamp }}</b></div>

  <h2>Current Model</h2>
  {% if record %}
  <table>
    <tr><th>Status</th><td>{{ record.status }}</td></tr>
    <tr><th>Checked at</th><td>{{ record.timestamp }}</td></tr>
    <tr><th>Reference</th><td>{{ record.reference_path }}</td></tr>
    <tr><th>Resolves to</th><td>{{ record.resolved_path }}</td></tr>
    <tr><th>Size (bytes)</th><td>{{ record.size_bytes }}</td></tr>
  </table>
  {% else %}
  <p>No smoke test summary found. Run the smoke test before generating the report.</p>
  {% endif %}
</body>
</html>
"#;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("rendering report template: {0}")]
    Render(#[from] minijinja::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Smoke(#[from] SmokeError),
}

/// Render the latest health record (if any) into
/// `<report_dir>/model_report_<timestamp>.html` and return the output path.
pub fn generate(report_dir: &Path, environment: &str) -> Result<PathBuf, ReportError> {
    let record = smoketest::load_summary(report_dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();

    let mut env = Environment::new();
    env.add_template("report", TEMPLATE)?;
    let html = env.get_template("report")?.render(context! {
        environment => environment,
        timestamp => format!("{timestamp}Z"),
        record => record,
    })?;

    fs::create_dir_all(report_dir)?;
    let out = report_dir.join(format!("{REPORT_PREFIX}{timestamp}.html"));
    fs::write(&out, html)?;
    tracing::info!(path = %out.display(), "report generated");
    Ok(out)
}

/// The most recently generated report, used by the email step. Name order
/// matches generation order, so the greatest name wins ties on equal mtimes.
pub fn latest_report(report_dir: &Path) -> Result<Option<PathBuf>, std::io::Error> {
    let entries = match fs::read_dir(report_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut newest: Option<(std::time::SystemTime, String, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(REPORT_PREFIX) || !name.ends_with(".html") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let candidate = (modified, name, entry.path());
        if newest.as_ref().map(|best| candidate > *best).unwrap_or(true) {
            newest = Some(candidate);
        }
    }
    Ok(newest.map(|(_, _, path)| path))
}
