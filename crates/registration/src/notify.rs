use async_trait::async_trait;
use tracing::info;

/// The caller's reporting channel.
///
/// Delivery failures are the implementation's problem: a flow never stops
/// because a progress message could not be sent.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

/// Reports to the log, for runs started from the terminal
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        info!(target: "trialbot::notify", "{}", text);
    }
}
