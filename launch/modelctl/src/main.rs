// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! modelctl wires the pipeline steps into one binary: refresh the model
//! artifact, smoke test the current reference, render and deliver reports,
//! and run the host-level health probes CI gates on.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use modelops_pipeline::checks;
use modelops_pipeline::config::{ConfigError, EnvironmentConfig};
use modelops_pipeline::logging;
use modelops_pipeline::notify;
use modelops_pipeline::refresh::{RefreshError, RefreshOutcome, Refresher};
use modelops_pipeline::report;
use modelops_pipeline::smoketest::{self, SmokeError};
use modelops_pipeline::source::LocateError;

#[derive(Parser)]
#[command(
    author = "NVIDIA",
    version,
    about = "Operational commands for the model serving pipeline",
    long_about = None,
)]
struct Cli {
    /// Deployment environment (falls back to MODELOPS_ENV, then 'dev')
    #[arg(short, long, global = true)]
    environment: Option<String>,

    /// Config file path (falls back to MODELOPS_CONFIG_PATH, then configs/env.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the model artifact and repoint the current reference
    Refresh,

    /// Verify the current reference and write the health record
    Smoketest,

    /// Render the HTML report from the latest health record
    Report,

    /// Send best-effort notifications (webhook alert and/or emailed report)
    Notify {
        /// Send the webhook alert
        #[arg(long)]
        webhook: bool,

        /// Email the latest report
        #[arg(long)]
        email: bool,
    },

    /// Validate the environment configuration
    ValidateConfig,

    /// Host-level health probes
    Check {
        #[command(subcommand)]
        probe: CheckCommands,
    },
}

#[derive(Subcommand)]
enum CheckCommands {
    /// Free disk space against disk_free_threshold
    Disk,

    /// Whether app_port is free to bind
    Port,

    /// Whether service_name is running
    Service,
}

/// A failed health probe or absent prerequisite.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct PreconditionFailed {
    message: String,
}

fn precondition(message: String) -> anyhow::Error {
    PreconditionFailed { message }.into()
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let environment = EnvironmentConfig::resolve_environment(cli.environment.as_deref());
    let cfg = EnvironmentConfig::load(cli.environment.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Refresh => {
            match Refresher::new(cfg).run().await? {
                RefreshOutcome::Updated(version) => {
                    println!("Updated to version: {version}");
                }
                RefreshOutcome::UpToDate(version) => {
                    println!("Model already up-to-date ({version})");
                }
            }
        }
        Commands::Smoketest => {
            smoketest::verify(&cfg, &environment)?;
            println!(
                "Smoke test summary written: {}",
                cfg.report_dir.join(smoketest::SUMMARY_FILE).display()
            );
        }
        Commands::Report => {
            let path = report::generate(&cfg.report_dir, &environment)?;
            println!("Report generated: {}", path.display());
        }
        Commands::Notify { webhook, email } => {
            // With neither flag, attempt both channels.
            let (webhook, email) = if !webhook && !email {
                (true, true)
            } else {
                (webhook, email)
            };
            if webhook {
                if let Err(err) = notify::send_webhook_alert(&environment).await {
                    tracing::warn!("webhook notification failed: {err}");
                }
            }
            if email {
                if let Err(err) = notify::email_latest_report(&cfg, &environment).await {
                    tracing::warn!("email notification failed: {err}");
                }
            }
        }
        Commands::ValidateConfig => {
            cfg.validate_values()?;
            let missing =
                EnvironmentConfig::missing_required_keys(&environment, cli.config.as_deref())?;
            if !missing.is_empty() {
                anyhow::bail!("missing config keys: {}", missing.join(", "));
            }
            println!("Config validation passed");
        }
        Commands::Check { probe } => run_check(probe, &cfg)?,
    }
    Ok(())
}

fn run_check(probe: CheckCommands, cfg: &EnvironmentConfig) -> anyhow::Result<()> {
    match probe {
        CheckCommands::Disk => {
            let report = checks::disk_report()
                .ok_or_else(|| anyhow::anyhow!("no disks visible to probe"))?;
            println!(
                "Total: {:.2} GB  Free: {:.2} GB ({:.2}%, threshold: {:.2}%)",
                report.total_bytes as f64 / 1e9,
                report.available_bytes as f64 / 1e9,
                report.free_percent,
                cfg.disk_free_threshold,
            );
            if report.free_percent < cfg.disk_free_threshold {
                return Err(precondition(format!(
                    "low disk space: {:.2}% free (threshold {:.2}%)",
                    report.free_percent, cfg.disk_free_threshold
                )));
            }
        }
        CheckCommands::Port => {
            if checks::port_in_use(cfg.app_port) {
                return Err(precondition(format!(
                    "port {} is already in use",
                    cfg.app_port
                )));
            }
            println!("Port {} is free", cfg.app_port);
        }
        CheckCommands::Service => {
            let Some(name) = cfg.service_name.as_deref() else {
                anyhow::bail!("service_name is not set in the environment config");
            };
            if !checks::process_running(name) {
                return Err(precondition(format!("process '{name}' is not running")));
            }
            println!("Process '{name}' is running");
        }
    }
    Ok(())
}

/// Exit-code convention: 0 success or no-op, 2 missing precondition or
/// artifact/reference absent, 3 unsupported mode or parse error,
/// 4 environment not found. Everything else is 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<ConfigError>() {
        return match err {
            ConfigError::NotFound(_) => 2,
            ConfigError::Parse { .. } | ConfigError::Invalid { .. } => 3,
            ConfigError::EnvironmentNotDefined { .. } => 4,
        };
    }
    if let Some(err) = err.downcast_ref::<RefreshError>() {
        return match err {
            RefreshError::NoArtifactAvailable { .. } => 2,
            RefreshError::Locate(locate) => locate_code(locate),
            _ => 1,
        };
    }
    if let Some(err) = err.downcast_ref::<LocateError>() {
        return locate_code(err);
    }
    if err.downcast_ref::<SmokeError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<PreconditionFailed>().is_some() {
        return 2;
    }
    1
}

fn locate_code(err: &LocateError) -> u8 {
    match err {
        LocateError::UnsupportedSourceMode(_) => 3,
        LocateError::MissingCredentials(_) | LocateError::MissingKey(_) => 2,
        _ => 1,
    }
}
