use std::time::SystemTime;

use trialbot_core::{MailboxIdentity, SignupOutcome};

/// State machine for the signup process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupState {
    Initial,
    NavigatingToSignup,
    CheckingChallenge,
    FillingSignupForm { username: String },
    AwaitingUsernameCheck,
    RetryingUsername { username: String },
    AwaitingDashboard,
    FillingPayment,
    SelectingServer,
    Finished(SignupOutcome),
}

impl SignupState {
    pub fn name(&self) -> &'static str {
        match self {
            SignupState::Initial => "initial",
            SignupState::NavigatingToSignup => "navigating_to_signup",
            SignupState::CheckingChallenge => "checking_challenge",
            SignupState::FillingSignupForm { .. } => "filling_signup_form",
            SignupState::AwaitingUsernameCheck => "awaiting_username_check",
            SignupState::RetryingUsername { .. } => "retrying_username",
            SignupState::AwaitingDashboard => "awaiting_dashboard",
            SignupState::FillingPayment => "filling_payment",
            SignupState::SelectingServer => "selecting_server",
            SignupState::Finished(_) => "finished",
        }
    }
}

/// Transition between states with timestamp and evidence
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: &'static str,
    pub to: &'static str,
    pub timestamp: SystemTime,
    pub details: Option<String>,
}

/// Context for one signup attempt
#[derive(Debug)]
pub struct SignupContext {
    pub state: SignupState,
    pub address: String,
    /// Username last submitted to the form
    pub username: String,
    pub username_retried: bool,
    /// Server value picked on the last page
    pub server: Option<String>,
    pub evidence: Vec<StateTransition>,
    pub started_at: SystemTime,
}

impl SignupContext {
    pub fn new(identity: &MailboxIdentity) -> Self {
        Self {
            state: SignupState::Initial,
            address: identity.address(),
            username: identity.local_part.clone(),
            username_retried: false,
            server: None,
            evidence: Vec::new(),
            started_at: SystemTime::now(),
        }
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: SignupState, details: Option<String>) {
        let old_state = std::mem::replace(&mut self.state, new_state);

        tracing::debug!(
            address = %self.address,
            from = old_state.name(),
            to = self.state.name(),
            "signup state transition"
        );

        self.evidence.push(StateTransition {
            from: old_state.name(),
            to: self.state.name(),
            timestamp: SystemTime::now(),
            details,
        });
    }

    /// Names of the states walked so far, starting after `Initial`
    pub fn visited(&self) -> Vec<&'static str> {
        self.evidence.iter().map(|t| t.to).collect()
    }

    /// Get duration since start
    pub fn duration(&self) -> std::time::Duration {
        self.started_at.elapsed().unwrap_or_default()
    }
}
