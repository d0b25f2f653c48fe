//! SMTP delivery

use crate::alerts::Notifier;
use crate::config::{EmailSettings, SmtpSecurity};
use crate::error::AlertError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::debug;
use std::time::Duration;

/// Sends one plain-text message to every configured recipient
pub struct EmailNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Create the SMTP transport
    ///
    /// # Arguments
    ///
    /// * `settings` - Server, credentials and addresses
    /// * `timeout` - Bound on every SMTP command, connection included
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Misconfigured` when the host or an address is
    /// missing or invalid.
    pub fn new(settings: &EmailSettings, timeout: Duration) -> Result<Self, AlertError> {
        let host = settings
            .host
            .as_deref()
            .ok_or_else(|| AlertError::Misconfigured("smtp_host is not set".to_string()))?;

        let mut builder = match settings.security {
            SmtpSecurity::Tls => SmtpTransport::relay(host)?,
            SmtpSecurity::StartTls => SmtpTransport::starttls_relay(host)?,
            SmtpSecurity::None => SmtpTransport::builder_dangerous(host),
        }
        .port(settings.port)
        .timeout(Some(timeout));

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = settings
            .from
            .as_deref()
            .ok_or_else(|| AlertError::Misconfigured("smtp_from is not set".to_string()))
            .and_then(parse_mailbox)?;
        let to = settings
            .to
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(AlertError::Misconfigured("smtp_to is empty".to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn message(&self, subject: &str, body: &str) -> Result<Message, AlertError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AlertError::NotificationFailed(format!("Invalid message: {}", e)))
    }
}

impl Notifier for EmailNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        let message = self.message(subject, body)?;
        let response = self.transport.send(&message)?;
        debug!("SMTP server answered {}", response.code());
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, AlertError> {
    address
        .parse()
        .map_err(|e| AlertError::Misconfigured(format!("Invalid address '{}': {}", address, e)))
}
