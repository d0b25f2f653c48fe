//! Report formatting and notification transports

pub mod email;
pub mod notifier;
pub mod report;
pub mod webhook;

pub use email::EmailNotifier;
pub use notifier::{build_notifier, deliver, LogNotifier, Notifier};
pub use report::Report;
pub use webhook::WebhookNotifier;
