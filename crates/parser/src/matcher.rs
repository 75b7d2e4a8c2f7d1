use tracing::debug;

use trialbot_core::config::MatcherConfig;
use trialbot_core::InboxMessage;

/// Decides whether an inbox message is the signup confirmation.
///
/// Any single hit qualifies. False positives are accepted; the relay and
/// provider details are not always present on the real message.
#[derive(Debug, Clone)]
pub struct MessageMatcher {
    product_name: String,
    confirmation_phrase: String,
    relay_fragment: String,
}

impl MessageMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            product_name: config.product_name.to_lowercase(),
            confirmation_phrase: config.confirmation_phrase.to_lowercase(),
            relay_fragment: config.relay_fragment.to_lowercase(),
        }
    }

    pub fn is_target(&self, msg: &InboxMessage) -> bool {
        let sender = msg.sender.to_lowercase();
        let subject = msg.subject.to_lowercase();
        let body = msg.body_html.to_lowercase();

        let hit = contains(&subject, &self.product_name)
            || contains(&subject, &self.confirmation_phrase)
            || contains(&body, &self.product_name)
            || contains(&sender, &self.relay_fragment);

        debug!(sender = %msg.sender, subject = %msg.subject, hit, "evaluated inbox message");
        hit
    }
}

impl Default for MessageMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

// An empty needle would match everything.
fn contains(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.contains(needle)
}
