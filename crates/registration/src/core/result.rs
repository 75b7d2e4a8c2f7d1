use trialbot_core::SignupOutcome;

use super::context::*;

/// Signup outcome with diagnostics
#[derive(Debug, Clone)]
pub struct SignupReport {
    pub outcome: SignupOutcome,
    pub address: String,
    pub username: String,
    pub username_retried: bool,
    pub server: Option<String>,
    pub state_transitions: Vec<String>,
    pub total_duration_ms: u128,
}

impl SignupReport {
    pub fn new(outcome: SignupOutcome, context: SignupContext) -> Self {
        Self {
            total_duration_ms: context.duration().as_millis(),
            state_transitions: context
                .evidence
                .iter()
                .map(|t| format!("{} -> {}", t.from, t.to))
                .collect(),
            outcome,
            address: context.address,
            username: context.username,
            username_retried: context.username_retried,
            server: context.server,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        match &self.outcome {
            SignupOutcome::Succeeded => format!(
                "✓ Signup successful for '{}' in {}ms (username retried: {}, server: {})",
                self.username,
                self.total_duration_ms,
                self.username_retried,
                self.server.as_deref().unwrap_or("-")
            ),
            other => format!(
                "✗ Signup for {} stopped: {} (duration: {}ms)",
                self.address, other, self.total_duration_ms
            ),
        }
    }
}
