use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat user id of whoever issued a command.
pub type RequesterId = i64;

/// Disposable mailbox generated for one signup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxIdentity {
    pub local_part: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

impl MailboxIdentity {
    /// Full `local@domain` address.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }

    /// Identity for an address that already exists, e.g. one generated by an
    /// earlier run. `None` unless it has exactly one `@` with text on both sides.
    pub fn from_address(address: &str, created_at: DateTime<Utc>) -> Option<Self> {
        let (local_part, domain) = address.trim().split_once('@')?;
        if local_part.is_empty() || domain.is_empty() || domain.contains('@') {
            return None;
        }
        Some(Self {
            local_part: local_part.to_string(),
            domain: domain.to_string(),
            created_at,
        })
    }
}

impl fmt::Display for MailboxIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// A message as returned by the mailbox provider API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    #[serde(rename = "from", default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "html", default)]
    pub body_html: String,
}

/// Terminal result of one signup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    Succeeded,
    ChallengeDetected(String),
    Failed(String),
}

impl SignupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SignupOutcome::Succeeded)
    }
}

impl fmt::Display for SignupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignupOutcome::Succeeded => write!(f, "succeeded"),
            SignupOutcome::ChallengeDetected(reason) => write!(f, "challenge detected: {}", reason),
            SignupOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Terminal result of one inbox polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    Confirmed,
    ConfirmedButLinkFailed,
    TimedOut,
}
