//! Outgoing mail
//!
//! Mail is best-effort: [`dispatch`] hands the message to a background task
//! and only logs failures.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::settings::Settings;

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// SMTP relay with STARTTLS
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        server: &str,
        port: u16,
        credentials: Option<(String, String)>,
        sender: &str,
    ) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {}", e))?
            .port(port);

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let sender = sender
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid sender address: {}", e))?;

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(email
                .to
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid recipient address: {}", e))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| anyhow::anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send email: {}", e))?;

        info!("Email sent to {}", email.to);
        Ok(())
    }
}

/// Writes mail to the log instead of sending it; used when no SMTP server is
/// configured
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<()> {
        info!(
            "Mail to {} | {}\n{}",
            email.to, email.subject, email.body
        );
        Ok(())
    }
}

/// Pick the transport for the configured mail settings
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn Mailer>> {
    match &settings.mail_server {
        Some(server) => {
            let credentials = settings
                .mail_username
                .clone()
                .zip(settings.mail_password.clone());
            let mailer = SmtpMailer::new(server, settings.mail_port, credentials, &settings.mail_sender)?;
            info!("Mail goes through SMTP server {}:{}", server, settings.mail_port);
            Ok(Arc::new(mailer))
        }
        None => {
            info!("No mail server configured, mail is logged only");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Send without waiting for the outcome
pub fn dispatch(mailer: Arc<dyn Mailer>, email: Email) {
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            error!("Failed to deliver mail to {}: {}", to, e);
        }
    });
}

/// The password reset message for `to`, pointing at `link`
pub fn reset_email(to: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        body: format!(
            "To reset your password, visit the following link:\n{}\n\n\
             If you did not make this request then simply ignore this email \
             and no changes will be made.\n",
            link
        ),
    }
}
