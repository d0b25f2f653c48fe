//! Configuration resolution and validation

pub mod provider;
pub mod settings;
pub mod template;

pub use provider::ConfigProvider;
pub use settings::{
    EmailSettings, HistoryWindow, NotifierKind, NotifierSettings, Settings, SmtpSecurity,
};
pub use template::Template;
