//! Reward e-mail dispatch
//!
//! Mail delivery is a collaborator behind the [`Mailer`] trait. The gate only
//! sends after a submission has been persisted, and a failed send is logged
//! rather than surfaced to the submitter.

use crate::config::NotifyConfig;
use crate::error::{GateError, Result};
use crate::types::SubmissionRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outbound e-mail collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Posts messages as JSON to a transactional-mail HTTP endpoint
pub struct HttpMailer {
    endpoint: String,
    api_key: String,
    from_address: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(GateError::Config(config::ConfigError::Message(
                "notify.endpoint not set".to_string(),
            )));
        }

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        debug!("Sending mail via {}", self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&MailRequest {
            from: &self.from_address,
            to,
            subject,
            text: body,
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GateError::Notification(format!(
                "mail endpoint returned {}: {}",
                status, error_text
            )));
        }
        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!("Mail to {}: {}", to, subject);
        Ok(())
    }
}

/// Mailer for `config`, or `None` when notifications are disabled
pub fn mailer_from_config(config: &NotifyConfig) -> Result<Option<Arc<dyn Mailer>>> {
    if !config.enabled {
        return Ok(None);
    }
    if config.dry_run {
        info!("Reward mails will be logged, not sent");
        return Ok(Some(Arc::new(LogMailer)));
    }
    Ok(Some(Arc::new(HttpMailer::new(config)?)))
}

/// Subject and body of the reward notification for `record`
pub fn reward_message(
    event_name: &str,
    record: &SubmissionRecord,
    tier_description: Option<&str>,
) -> (String, String) {
    let subject = format!("Your {} reward code: {}", event_name, record.tier);

    let mut body = format!(
        "Thanks for your submission to {}!\n\n\
         Score: {}/10\n\
         Tier: {}\n\
         Code: {}\n",
        event_name, record.score, record.tier, record.code
    );
    if let Some(description) = tier_description.filter(|d| !d.is_empty()) {
        body.push_str(&format!("Reward: {}\n", description));
    }
    body.push_str(&format!("\n{}\n\n", record.rationale));
    body.push_str("Show this code at the counter to redeem it. Each code works once.\n");

    (subject, body)
}
