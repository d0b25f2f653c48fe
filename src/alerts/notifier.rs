//! Delivery of a report through the configured transport

use crate::alerts::email::EmailNotifier;
use crate::alerts::webhook::WebhookNotifier;
use crate::alerts::Report;
use crate::config::{NotifierKind, NotifierSettings};
use crate::error::AlertError;
use log::{error, info, warn};

/// A transport able to deliver a subject and a body
///
/// Implementations make exactly one attempt; a failed delivery is reported
/// to the caller and never retried.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError>;
}

/// Writes notifications to the log and stdout
///
/// Suitable for cron, which mails whatever a job prints.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        warn!("{}", subject);
        println!("{}\n\n{}", subject, body);
        Ok(())
    }
}

/// Build the notifier selected by `settings`
///
/// # Errors
///
/// Returns `AlertError::Misconfigured` when the transport cannot be set up
/// from the given settings.
pub fn build_notifier(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, AlertError> {
    match settings.kind {
        NotifierKind::Log => Ok(Box::new(LogNotifier)),
        NotifierKind::Email => Ok(Box::new(EmailNotifier::new(
            &settings.email,
            settings.timeout,
        )?)),
        NotifierKind::Webhook => {
            let url = settings
                .webhook_url
                .as_deref()
                .ok_or_else(|| AlertError::Misconfigured("webhook_url is not set".to_string()))?;
            Ok(Box::new(WebhookNotifier::new(url, settings.timeout)?))
        }
    }
}

/// Send `report` once, logging the outcome
pub fn deliver(notifier: &dyn Notifier, report: &Report) -> Result<(), AlertError> {
    match notifier.send(&report.subject, &report.body) {
        Ok(()) => {
            info!("Sent notification: {}", report.subject);
            Ok(())
        }
        Err(e) => {
            error!("Failed to send notification: {}", e);
            Err(e)
        }
    }
}
