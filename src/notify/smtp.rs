// src/notify/smtp.rs
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::{SmtpConfig, SmtpSecurity};
use crate::error::{PageWatchError, PageWatchResult};

use super::{Notification, NotificationSink};

/// Mails notifications through an SMTP relay
pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_mailbox(address: &str) -> PageWatchResult<Mailbox> {
    address
        .parse()
        .map_err(|e| PageWatchError::Config(format!("Invalid mail address {}: {}", address, e)))
}

impl SmtpSink {
    pub fn from_config(config: &SmtpConfig) -> PageWatchResult<Self> {
        let from = parse_mailbox(&config.from)?;
        let to = config.to
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<PageWatchResult<Vec<_>>>()?;

        if to.is_empty() {
            return Err(PageWatchError::Config("No mail recipients configured".to_string()));
        }

        let builder = match config.security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
            SmtpSecurity::Plain => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)),
        }
        .map_err(|e| PageWatchError::Config(format!("Invalid SMTP relay {}: {}", config.host, e)))?;

        let mut builder = builder.port(config.port);
        if !config.user.is_empty() {
            builder = builder.credentials(Credentials::new(config.user.clone(), config.pass.clone()));
        }

        debug!("SMTP relay {}:{} ({:?})", config.host, config.port, config.security);

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn message(&self, notification: &Notification) -> PageWatchResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        builder
            .body(notification.body.clone())
            .map_err(|e| PageWatchError::Delivery(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    async fn send(&self, notification: &Notification) -> PageWatchResult<()> {
        let message = self.message(notification)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PageWatchError::Delivery(e.to_string()))?;

        info!("Mailed \"{}\" to {} recipient(s)", notification.subject, self.to.len());
        Ok(())
    }
}
