// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Best-effort outbound delivery: a webhook alert and an emailed copy of the
//! latest report.
//!
//! Unconfigured channels are skips, not errors. Delivery failures are
//! returned so the caller can log them, but they stop at the notify boundary;
//! the pipeline never fails because a message did not go out.

use std::path::Path;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;

use crate::config::EnvironmentConfig;
use crate::report;

const WEBHOOK_URL_ENV: &str = "ALERT_WEBHOOK_URL";
const WEBHOOK_FORMAT_ENV: &str = "ALERT_FORMAT";
const WEBHOOK_TEXT_ENV: &str = "ALERT_TEXT";

const SMTP_HOST_ENV: &str = "SMTP_HOST";
const SMTP_PORT_ENV: &str = "SMTP_PORT";
const SMTP_USER_ENV: &str = "SMTP_USER";
const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM: &str = "no-reply@company.com";
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(String),

    #[error("building email message: {0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Post an alert to the webhook named by `ALERT_WEBHOOK_URL`. Returns
/// whether a message was actually sent; an unset URL is a skip.
pub async fn send_webhook_alert(environment: &str) -> Result<bool, DeliveryError> {
    let Some(url) = env_nonempty(WEBHOOK_URL_ENV) else {
        tracing::info!("{WEBHOOK_URL_ENV} is not set; skipping webhook notification");
        return Ok(false);
    };
    let format = std::env::var(WEBHOOK_FORMAT_ENV)
        .unwrap_or_else(|_| "slack".to_string())
        .to_lowercase();
    let text = env_nonempty(WEBHOOK_TEXT_ENV)
        .unwrap_or_else(|| format!("model pipeline alert for env={environment}"));

    // Slack and Teams incoming webhooks both accept a bare text payload.
    let payload = json!({ "text": text });
    let client = reqwest::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .build()?;
    client
        .post(&url)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;

    tracing::info!(format = %format, "alert delivered");
    Ok(true)
}

/// Email the most recent HTML report. Every unconfigured precondition
/// (no report yet, no recipient, incomplete SMTP settings) is a graceful
/// skip returning `Ok(false)`.
pub async fn email_latest_report(
    cfg: &EnvironmentConfig,
    environment: &str,
) -> Result<bool, DeliveryError> {
    let Some(report_path) = report::latest_report(&cfg.report_dir)? else {
        tracing::info!("no report found to email; skipping email step");
        return Ok(false);
    };
    let Some(to_addr) = cfg.report_email_to.as_deref() else {
        tracing::info!("report_email_to is not configured; skipping email step");
        return Ok(false);
    };
    let Some(smtp) = smtp_settings() else {
        tracing::info!(
            "SMTP credentials not fully configured; skipping email step. \
             Provide {SMTP_HOST_ENV}, {SMTP_PORT_ENV}, {SMTP_USER_ENV} and {SMTP_PASSWORD_ENV} to enable emailing."
        );
        return Ok(false);
    };
    let from_addr = cfg.report_email_from.as_deref().unwrap_or(DEFAULT_FROM);

    let message = build_report_email(&report_path, from_addr, to_addr, environment).await?;
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        .map_err(|err| DeliveryError::Smtp(err.to_string()))?
        .port(smtp.port)
        .credentials(Credentials::new(smtp.user, smtp.password))
        .timeout(Some(SMTP_TIMEOUT))
        .build();
    transport
        .send(message)
        .await
        .map_err(|err| DeliveryError::Smtp(err.to_string()))?;

    tracing::info!(to = %to_addr, "report emailed");
    Ok(true)
}

async fn build_report_email(
    report_path: &Path,
    from_addr: &str,
    to_addr: &str,
    environment: &str,
) -> Result<Message, DeliveryError> {
    let report_name = report_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.html".to_string());
    let html = tokio::fs::read_to_string(report_path).await?;

    let from: Mailbox = from_addr
        .parse()
        .map_err(|_| DeliveryError::Message(format!("invalid from address: {from_addr}")))?;
    let to: Mailbox = to_addr
        .parse()
        .map_err(|_| DeliveryError::Message(format!("invalid to address: {to_addr}")))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(format!("[{environment}] Model Report: {report_name}"))
        .multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(format!(
                    "Attached: {report_name}\nEnvironment: {environment}"
                )))
                .singlepart(SinglePart::html(html)),
        )
        .map_err(|err| DeliveryError::Message(err.to_string()))
}

struct SmtpSettings {
    host: String,
    port: u16,
    user: String,
    password: String,
}

fn smtp_settings() -> Option<SmtpSettings> {
    let host = env_nonempty(SMTP_HOST_ENV)?;
    let user = env_nonempty(SMTP_USER_ENV)?;
    let password = env_nonempty(SMTP_PASSWORD_ENV)?;
    let port = match env_nonempty(SMTP_PORT_ENV) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "{SMTP_PORT_ENV} is not a valid integer; falling back to {DEFAULT_SMTP_PORT}");
            DEFAULT_SMTP_PORT
        }),
        None => DEFAULT_SMTP_PORT,
    };
    Some(SmtpSettings {
        host,
        port,
        user,
        password,
    })
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
