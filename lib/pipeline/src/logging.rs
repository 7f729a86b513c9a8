// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Logging setup.
//!
//! Filters come from the `MODELOPS_LOG` environment variable (same syntax as
//! `RUST_LOG`, default `info`). Set `MODELOPS_LOG_JSONL=1` to emit one JSON
//! object per line instead of the human-readable format.

use std::sync::Once;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// ENV used to set the log level
const FILTER_ENV: &str = "MODELOPS_LOG";

/// ENV used to switch to JSONL output
const JSONL_ENV: &str = "MODELOPS_LOG_JSONL";

/// Default log level
const DEFAULT_FILTER_LEVEL: &str = "info";

static INIT: Once = Once::new();

/// Initialize logging for the process. Safe to call more than once.
pub fn init() {
    INIT.call_once(setup_logging);
}

fn jsonl_enabled() -> bool {
    std::env::var(JSONL_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER_LEVEL));

    // The generics mean we have to repeat everything. Each builder method
    // returns a specialized type.
    if jsonl_enabled() {
        let layer = fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    }
}
