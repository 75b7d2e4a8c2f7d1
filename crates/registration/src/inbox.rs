/// Mailbox provider API and confirmation-link clicks
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use trialbot_core::config::MailboxConfig;
use trialbot_core::InboxMessage;

#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mailbox api returned HTTP {0}")]
    Status(u16),

    #[error("invalid mailbox api url: {0}")]
    InvalidUrl(String),
}

/// Reads the messages currently in a mailbox
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    async fn fetch_messages(&self, address: &str) -> Result<Vec<InboxMessage>, MailboxError>;
}

/// Follows a confirmation link
#[async_trait]
pub trait LinkClicker: Send + Sync {
    async fn follow(&self, link: &str) -> Result<(), MailboxError>;
}

/// testmail.app-style inbox API: bearer-authenticated GET per address
pub struct TestmailClient {
    http_client: reqwest::Client,
    api_base: Url,
    api_key: String,
}

impl TestmailClient {
    pub fn new(config: &MailboxConfig) -> Result<Self, MailboxError> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| MailboxError::InvalidUrl(format!("{}: {}", config.api_base, e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            api_base,
            api_key: config.api_key.clone(),
        })
    }

    /// `{api_base}/api/inboxes/{address}`
    pub fn inbox_url(&self, address: &str) -> Result<Url, MailboxError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| MailboxError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["api", "inboxes", address]);
        Ok(url)
    }
}

#[async_trait]
impl MailboxProvider for TestmailClient {
    async fn fetch_messages(&self, address: &str) -> Result<Vec<InboxMessage>, MailboxError> {
        let url = self.inbox_url(address)?;
        debug!("checking inbox for {}", address);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailboxError::Status(response.status().as_u16()));
        }

        let inbox: InboxResponse = response.json().await?;
        debug!("found {} messages for {}", inbox.messages.len(), address);
        Ok(inbox.messages)
    }
}

#[derive(Debug, Deserialize)]
struct InboxResponse {
    #[serde(default)]
    messages: Vec<InboxMessage>,
}

/// Plain GET on the link. Any response counts as a click; only transport
/// errors fail.
pub struct HttpLinkClicker {
    http_client: reqwest::Client,
}

impl HttpLinkClicker {
    pub fn new(timeout: Duration) -> Result<Self, MailboxError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl LinkClicker for HttpLinkClicker {
    async fn follow(&self, link: &str) -> Result<(), MailboxError> {
        info!("Clicking confirmation link: {}", link);
        let response = self.http_client.get(link).send().await?;
        info!(status = response.status().as_u16(), "confirmation link answered");
        Ok(())
    }
}
