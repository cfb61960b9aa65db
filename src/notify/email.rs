// src/notify/email.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use metrics::counter;

use super::DigestSink;
use crate::config::EmailConfig;
use crate::error::ConfigError;

/// SMTP over implicit TLS, one message addressed to every recipient.
pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn mailbox(var: &str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.parse().map_err(|e: lettre::address::AddressError| ConfigError::InvalidEnvVar {
        var: var.into(),
        reason: format!("{raw}: {e}"),
    })
}

impl EmailSender {
    /// Validates addresses and the relay host; nothing is sent here.
    pub fn from_config(cfg: &EmailConfig) -> Result<Self, ConfigError> {
        let from = mailbox("SENDER_EMAIL", &cfg.sender)?;
        let to = cfg
            .recipients
            .iter()
            .map(|r| mailbox("RECIPIENT_EMAIL", r))
            .collect::<Result<Vec<_>, _>>()?;

        let creds = Credentials::new(cfg.sender.clone(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "SMTP_HOST".into(),
                reason: e.to_string(),
            })?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }

    pub fn recipients(&self) -> &[Mailbox] {
        &self.to
    }
}

#[async_trait]
impl DigestSink for EmailSender {
    async fn send(&self, subject: &str, html: &str) -> Result<()> {
        let mut builder = Message::builder().from(self.from.clone());
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        let msg = builder
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        counter!("digest_emails_sent_total").increment(1);
        tracing::info!(recipients = self.to.len(), subject, "digest email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
