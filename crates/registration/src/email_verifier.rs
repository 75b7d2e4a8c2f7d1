/// Email verification - polls the inbox and clicks the confirmation link
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use trialbot_core::config::PollerConfig;
use trialbot_core::{MailboxIdentity, PollResult};
use trialbot_parser::{extract_confirmation_link, MessageMatcher};

use crate::inbox::{LinkClicker, MailboxProvider};
use crate::notify::Notifier;

pub struct InboxPoller {
    mailbox: Arc<dyn MailboxProvider>,
    clicker: Arc<dyn LinkClicker>,
    matcher: MessageMatcher,
    deadline: Duration,
    interval: Duration,
}

impl InboxPoller {
    pub fn new(
        mailbox: Arc<dyn MailboxProvider>,
        clicker: Arc<dyn LinkClicker>,
        matcher: MessageMatcher,
        config: &PollerConfig,
    ) -> Self {
        Self {
            mailbox,
            clicker,
            matcher,
            deadline: config.deadline(),
            interval: config.interval(),
        }
    }

    /// Poll until the confirmation arrives or the deadline passes, then
    /// report the result to `notifier`.
    pub async fn poll_and_confirm(&self, identity: &MailboxIdentity, notifier: &dyn Notifier) -> PollResult {
        let result = self.poll(identity).await;
        notifier.notify(&status_message(result, self.deadline)).await;
        result
    }

    async fn poll(&self, identity: &MailboxIdentity) -> PollResult {
        let address = identity.address();
        let started = Instant::now();
        let mut attempt = 0u32;

        info!("📧 Checking inbox for confirmation email: {}", address);

        loop {
            let remaining = self.deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            attempt += 1;

            // a stalled request must not carry the run past the deadline
            match tokio::time::timeout(remaining, self.mailbox.fetch_messages(&address)).await {
                Err(_) => {
                    debug!(attempt, "inbox fetch cut off at the deadline");
                    break;
                }
                Ok(Ok(messages)) => {
                    debug!(attempt, count = messages.len(), "fetched inbox");

                    for msg in messages.iter().filter(|m| self.matcher.is_target(m)) {
                        let Some(link) = extract_confirmation_link(&msg.body_html) else {
                            warn!(subject = %msg.subject, "matching message has no link, still waiting");
                            continue;
                        };

                        info!("✓ Found confirmation link: {}", link);
                        return match self.clicker.follow(&link).await {
                            Ok(()) => PollResult::Confirmed,
                            Err(e) => {
                                warn!("confirmation link click failed: {}", e);
                                PollResult::ConfirmedButLinkFailed
                            }
                        };
                    }
                }
                // transient; try again on the normal schedule
                Ok(Err(e)) => debug!(attempt, "inbox fetch skipped: {}", e),
            }

            let remaining = self.deadline.saturating_sub(started.elapsed());
            tokio::time::sleep(self.interval.min(remaining)).await;
        }

        warn!("✗ No confirmation email for {} after {} attempts", address, attempt);
        PollResult::TimedOut
    }
}

/// Final status text for the operator
pub fn status_message(result: PollResult, deadline: Duration) -> String {
    match result {
        PollResult::Confirmed => "✅ Email confirmed!".to_string(),
        PollResult::ConfirmedButLinkFailed => "⚠️ Found link but click failed.".to_string(),
        PollResult::TimedOut => format!(
            "❌ Timed out: no confirmation email in {}.",
            human_duration(deadline)
        ),
    }
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}
