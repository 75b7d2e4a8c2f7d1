use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;

use trialbot_core::config::AppConfig;
use trialbot_core::{MailboxIdentity, PollResult};
use trialbot_parser::MessageMatcher;
use trialbot_registration::{HttpLinkClicker, InboxPoller, LogNotifier, TestmailClient};

/// Poll the inbox of an address signed up earlier and click its link
pub async fn run(config: AppConfig, address: String) -> Result<()> {
    config.validate()?;

    let identity = MailboxIdentity::from_address(&address, Utc::now())
        .ok_or_else(|| anyhow!("not a mailbox address: {}", address))?;

    let mailbox = TestmailClient::new(&config.mailbox)?;
    let clicker = HttpLinkClicker::new(Duration::from_secs(config.mailbox.request_timeout_seconds))?;
    let poller = InboxPoller::new(
        Arc::new(mailbox),
        Arc::new(clicker),
        MessageMatcher::new(&config.matcher),
        &config.poller,
    );

    match poller.poll_and_confirm(&identity, &LogNotifier).await {
        PollResult::Confirmed => Ok(()),
        other => bail!("{} was not confirmed: {:?}", identity, other),
    }
}
