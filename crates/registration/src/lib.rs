// Core modules
pub mod core;
pub mod orchestrator;

pub mod browser;
pub mod captcha;
pub mod email_verifier;
pub mod identity;
pub mod inbox;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use crate::core::types::*;
pub use crate::core::context::*;
pub use crate::core::result::*;
pub use orchestrator::*;
pub use email_verifier::InboxPoller;
pub use identity::{IdentityGenerator, IdentityRegistry};
pub use inbox::{HttpLinkClicker, LinkClicker, MailboxError, MailboxProvider, TestmailClient};
pub use notify::{LogNotifier, Notifier};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}
