use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore, TryAcquireError};
use tracing::{error, info, warn};

use trialbot_core::{AppConfig, MailboxIdentity, PollResult, RequesterId, SignupOutcome};
use trialbot_parser::MessageMatcher;

use crate::browser::ChromeLauncher;
use crate::core::BrowserLauncher;
use crate::email_verifier::InboxPoller;
use crate::identity::{IdentityGenerator, IdentityRegistry};
use crate::inbox::{HttpLinkClicker, LinkClicker, MailboxError, MailboxProvider, TestmailClient};
use crate::notify::Notifier;
use crate::orchestrator::signup_engine::SignupAutomator;

pub const UNAUTHORIZED_TEXT: &str = "🚫 Unauthorized.";
pub const USAGE_TEXT: &str = "Usage: /fxr <username>";

/// How one orchestrated run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Unauthorized,
    InvalidName(String),
    /// Signup did not succeed, so the inbox was never polled
    SignupStopped(SignupOutcome),
    Finished(PollResult),
}

/// Identity -> signup -> inbox confirmation, reported to one notifier.
pub struct SignupFlow {
    operator: RequesterId,
    identities: IdentityGenerator,
    registry: Arc<IdentityRegistry>,
    automator: Arc<SignupAutomator>,
    launcher: Arc<dyn BrowserLauncher>,
    poller: Arc<InboxPoller>,
    sessions: Arc<Semaphore>,
}

impl SignupFlow {
    pub fn new(
        config: &AppConfig,
        operator: RequesterId,
        launcher: Arc<dyn BrowserLauncher>,
        mailbox: Arc<dyn MailboxProvider>,
        clicker: Arc<dyn LinkClicker>,
    ) -> Self {
        let poller = InboxPoller::new(
            mailbox,
            clicker,
            MessageMatcher::new(&config.matcher),
            &config.poller,
        );

        Self {
            operator,
            identities: IdentityGenerator::new(&config.mailbox),
            registry: Arc::new(IdentityRegistry::new()),
            automator: Arc::new(SignupAutomator::new(config.site.clone(), config.browser.clone())),
            launcher,
            poller: Arc::new(poller),
            sessions: Arc::new(Semaphore::new(config.flow.max_concurrent_sessions.max(1))),
        }
    }

    /// Wire up headless Chrome and the testmail API
    pub fn from_config(config: &AppConfig, operator: RequesterId) -> Result<Self, MailboxError> {
        let mailbox = TestmailClient::new(&config.mailbox)?;
        let clicker = HttpLinkClicker::new(Duration::from_secs(config.mailbox.request_timeout_seconds))?;

        Ok(Self::new(
            config,
            operator,
            Arc::new(ChromeLauncher::new(config.browser.clone())),
            Arc::new(mailbox),
            Arc::new(clicker),
        ))
    }

    pub fn operator(&self) -> RequesterId {
        self.operator
    }

    pub fn is_authorized(&self, requester: RequesterId) -> bool {
        requester == self.operator
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// Run the whole flow for one request.
    ///
    /// Every user-facing message goes through `notifier`; nothing here
    /// returns an error to the caller.
    pub async fn run(&self, requester: RequesterId, requested_name: &str, notifier: &dyn Notifier) -> FlowOutcome {
        if !self.is_authorized(requester) {
            warn!(requester, "rejected command from unauthorized user");
            notifier.notify(UNAUTHORIZED_TEXT).await;
            return FlowOutcome::Unauthorized;
        }

        let identity = match self.identities.generate(requested_name) {
            Ok(identity) => identity,
            Err(e) => {
                notifier.notify(&format!("❌ {}\n{}", e, USAGE_TEXT)).await;
                return FlowOutcome::InvalidName(e.to_string());
            }
        };
        self.registry.record(requester, identity.clone());

        notifier
            .notify(&format!(
                "📨 Generated email: {}\nSigning up & starting trial...",
                identity
            ))
            .await;

        match self.run_signup(&identity, notifier).await {
            SignupOutcome::Succeeded => {}
            SignupOutcome::Failed(reason) => {
                notifier.notify(&format!("❌ Signup failed: {}", reason)).await;
                return FlowOutcome::SignupStopped(SignupOutcome::Failed(reason));
            }
            // the challenge warning was forwarded as progress
            stopped @ SignupOutcome::ChallengeDetected(_) => {
                return FlowOutcome::SignupStopped(stopped);
            }
        }

        notifier.notify("✅ Trial started! Now confirming email...").await;
        let result = self.poller.poll_and_confirm(&identity, notifier).await;
        info!(address = %identity, ?result, "flow finished");
        FlowOutcome::Finished(result)
    }

    /// Hold a session permit, drive the browser on the blocking pool and
    /// forward its progress messages as they arrive
    async fn run_signup(&self, identity: &MailboxIdentity, notifier: &dyn Notifier) -> SignupOutcome {
        let permit = match self.sessions.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                notifier
                    .notify("⏳ Another signup is in progress; yours is queued.")
                    .await;
                match self.sessions.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return SignupOutcome::Failed("browser sessions closed".to_string()),
                }
            }
            Err(TryAcquireError::Closed) => {
                return SignupOutcome::Failed("browser sessions closed".to_string());
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let automator = self.automator.clone();
        let launcher = self.launcher.clone();
        let worker_identity = identity.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let report = automator.signup(launcher.as_ref(), &worker_identity, &tx);
            drop(permit);
            report
        });

        // ends when the worker drops its sender
        while let Some(message) = rx.recv().await {
            notifier.notify(&message).await;
        }

        match handle.await {
            Ok(report) => report.outcome,
            Err(e) => {
                error!(address = %identity, "signup worker crashed: {}", e);
                SignupOutcome::Failed(format!("signup worker crashed: {}", e))
            }
        }
    }
}
