use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;

use trialbot_core::config::MailboxConfig;
use trialbot_core::{MailboxIdentity, RequesterId};

use crate::RegistrationError;

/// Builds disposable mailbox addresses from a requested name.
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    domain_map: HashMap<String, String>,
    default_domain: String,
}

impl IdentityGenerator {
    pub fn new(config: &MailboxConfig) -> Self {
        Self {
            domain_map: config
                .domain_map
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            default_domain: config.default_domain.clone(),
        }
    }

    /// Mailbox domain for a requested name
    pub fn domain_for(&self, name: &str) -> &str {
        self.domain_map
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(self.default_domain.as_str())
    }

    /// Generate an identity stamped with the current time
    pub fn generate(&self, requested_name: &str) -> Result<MailboxIdentity, RegistrationError> {
        self.generate_at(requested_name, Utc::now())
    }

    /// Generate an identity for a fixed point in time.
    ///
    /// The local part is `<name>_<unix seconds>`, so two requests for the same
    /// name within one second collide.
    pub fn generate_at(
        &self,
        requested_name: &str,
        now: DateTime<Utc>,
    ) -> Result<MailboxIdentity, RegistrationError> {
        let name = requested_name.trim();
        if name.is_empty() {
            return Err(RegistrationError::InvalidName("name must not be empty".to_string()));
        }
        if name.contains('@') || name.chars().any(char::is_whitespace) {
            return Err(RegistrationError::InvalidName(format!(
                "'{}' cannot be used as a mailbox name",
                name
            )));
        }

        let identity = MailboxIdentity {
            local_part: format!("{}_{}", name, now.timestamp()),
            domain: self.domain_for(name).to_string(),
            created_at: now,
        };

        info!(address = %identity, "generated mailbox identity");
        Ok(identity)
    }
}

/// Last identity generated per requester.
///
/// Each key is written atomically; a requester racing with itself gets
/// last-write-wins.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: DashMap<RequesterId, MailboxIdentity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the identity for a requester, returning the one it replaced
    pub fn record(&self, requester: RequesterId, identity: MailboxIdentity) -> Option<MailboxIdentity> {
        self.entries.insert(requester, identity)
    }

    pub fn latest(&self, requester: RequesterId) -> Option<MailboxIdentity> {
        self.entries.get(&requester).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
