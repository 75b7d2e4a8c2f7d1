use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use trialbot_core::config::{BrowserConfig, SiteConfig};
use trialbot_core::{MailboxIdentity, SignupOutcome};

use crate::captcha;
use crate::core::*;
use crate::RegistrationError;

pub const SIGNUP_PATH: &str = "/signup";
pub const TRIAL_PATH: &str = "/trial";
pub const DASHBOARD_FRAGMENT: &str = "/dashboard";

/// Field names and controls of the target site's forms
pub mod selectors {
    pub const EMAIL_FIELD: &str = "input[name='email']";
    pub const USERNAME_FIELD: &str = "input[name='username']";
    pub const PASSWORD_FIELD: &str = "input[name='password']";
    pub const AGREE_CHECKBOX: &str = "input[name='agree']";
    pub const SUBMIT_BUTTON: &str = "button[type=submit]";
    pub const USERNAME_TAKEN_ERROR: &str = ".error.username";

    pub const CARD_NUMBER_FIELD: &str = "input[name='cardnumber']";
    pub const CARD_EXPIRY_FIELD: &str = "input[name='expdate']";
    pub const CARD_CVV_FIELD: &str = "input[name='cvv']";
    pub const START_TRIAL_BUTTON: &str = "button.start-trial";

    pub const SERVER_SELECT: &str = "select[name='server']";
    pub const CONFIRM_SERVER_BUTTON: &str = "button.confirm-server";
}

use selectors::*;

/// Drives the signup, trial and server-selection pages
pub struct SignupAutomator {
    site: SiteConfig,
    browser: BrowserConfig,
}

impl SignupAutomator {
    pub fn new(site: SiteConfig, browser: BrowserConfig) -> Self {
        Self { site, browser }
    }

    /// Run one signup in a fresh browser session.
    ///
    /// Blocks the calling thread. The session is dropped before this returns,
    /// whatever the outcome. Warnings for the operator go to `progress`.
    pub fn signup(
        &self,
        launcher: &dyn BrowserLauncher,
        identity: &MailboxIdentity,
        progress: &UnboundedSender<String>,
    ) -> SignupReport {
        let mut context = SignupContext::new(identity);

        info!(address = %identity, "starting signup");

        let outcome = match launcher.launch() {
            Ok(page) => {
                let outcome = self.drive(page.as_ref(), identity, progress, &mut context);
                drop(page);
                outcome
            }
            Err(e) => SignupOutcome::Failed(format!("browser launch failed: {}", e)),
        };

        context.transition(SignupState::Finished(outcome.clone()), Some(outcome.to_string()));
        let report = SignupReport::new(outcome, context);
        info!("{}", report.summary());
        report
    }

    /// Walk the signup state machine on an already open page
    pub fn drive(
        &self,
        page: &dyn PageDriver,
        identity: &MailboxIdentity,
        progress: &UnboundedSender<String>,
        context: &mut SignupContext,
    ) -> SignupOutcome {
        match self.try_drive(page, identity, progress, context) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(state = context.state.name(), "signup aborted: {}", e);
                SignupOutcome::Failed(format!("{} (while {})", e, context.state.name()))
            }
        }
    }

    fn try_drive(
        &self,
        page: &dyn PageDriver,
        identity: &MailboxIdentity,
        progress: &UnboundedSender<String>,
        context: &mut SignupContext,
    ) -> Result<SignupOutcome, RegistrationError> {
        let signup_url = self.page_url(SIGNUP_PATH)?;
        context.transition(SignupState::NavigatingToSignup, Some(signup_url.clone()));
        page.goto(&signup_url)?;

        context.transition(SignupState::CheckingChallenge, None);
        if let Some(challenge) = captcha::detect_challenge(page) {
            if progress.send(challenge.warning().to_string()).is_err() {
                debug!("progress receiver gone");
            }
            return Ok(SignupOutcome::ChallengeDetected(challenge.to_string()));
        }

        // Username is the full local part, timestamp suffix included
        let username = identity.local_part.clone();
        context.username = username.clone();
        context.transition(SignupState::FillingSignupForm { username: username.clone() }, None);

        page.fill(EMAIL_FIELD, &identity.address())?;
        page.fill(USERNAME_FIELD, &username)?;
        page.fill(PASSWORD_FIELD, &self.site.password)?;
        page.click(AGREE_CHECKBOX)?;
        page.click(SUBMIT_BUTTON)?;

        // At most one retry with a mutated username
        context.transition(SignupState::AwaitingUsernameCheck, None);
        if page
            .wait_for_element(USERNAME_TAKEN_ERROR, self.browser.username_error_timeout())
            .is_ok()
        {
            let retry = with_collision_suffix(&username, &mut rand::thread_rng());
            info!(taken = %username, retry = %retry, "username taken, retrying once");

            context.username = retry.clone();
            context.username_retried = true;
            context.transition(SignupState::RetryingUsername { username: retry.clone() }, None);

            page.fill(USERNAME_FIELD, &retry)?;
            page.click(SUBMIT_BUTTON)?;
        }

        context.transition(SignupState::AwaitingDashboard, None);
        match page.wait_for_url(DASHBOARD_FRAGMENT, self.browser.dashboard_timeout()) {
            Ok(()) => {}
            Err(RegistrationError::Timeout(_)) => {
                return Ok(SignupOutcome::Failed("dashboard redirect timed out".to_string()));
            }
            Err(e) => return Err(e),
        }

        let trial_url = self.page_url(TRIAL_PATH)?;
        context.transition(SignupState::FillingPayment, Some(trial_url.clone()));
        page.goto(&trial_url)?;
        page.fill(CARD_NUMBER_FIELD, &self.site.card_number)?;
        page.fill(CARD_EXPIRY_FIELD, &self.site.card_expiry)?;
        page.fill(CARD_CVV_FIELD, &self.site.card_cvv)?;
        page.click(START_TRIAL_BUTTON)?;

        context.transition(SignupState::SelectingServer, None);
        page.wait_for_element(SERVER_SELECT, self.browser.server_select_timeout())?;
        let Some(server) = page.select_first_valued_option(SERVER_SELECT)? else {
            return Ok(SignupOutcome::Failed("no server option available".to_string()));
        };
        info!(server = %server, "selected server");
        context.server = Some(server);
        page.click(CONFIRM_SERVER_BUTTON)?;

        Ok(SignupOutcome::Succeeded)
    }

    fn page_url(&self, path: &str) -> Result<String, RegistrationError> {
        self.site
            .page_url(path)
            .map(|url| url.to_string())
            .map_err(|e| RegistrationError::Other(e.to_string()))
    }
}

/// Username with a random three-digit suffix, for the collision retry
pub fn with_collision_suffix<R: Rng>(username: &str, rng: &mut R) -> String {
    format!("{}{}", username, rng.gen_range(100..=999))
}
