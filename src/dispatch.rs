use trialbot_core::RequesterId;
use trialbot_registration::{UNAUTHORIZED_TEXT, USAGE_TEXT};

pub const WELCOME_TEXT: &str =
    "Welcome, admin! Use /fxr <username> to automate FXReplay signup, trial, and email confirmation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// First argument only; the rest of the line is ignored
    Fxr(Option<String>),
}

/// What the bot does with one incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reply(String),
    StartFlow { name: String },
    Ignore,
}

/// Parse `/start` and `/fxr <name>`.
///
/// A command addressed as `/fxr@SomeBot` is only ours when `SomeBot` is
/// `bot_username`; with no known username every addressee is accepted.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let mut words = text.split_whitespace();
    let head = words.next()?.strip_prefix('/')?;
    let (command, addressee) = match head.split_once('@') {
        Some((command, addressee)) => (command, Some(addressee)),
        None => (head, None),
    };

    if let (Some(addressee), Some(ours)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(ours) {
            return None;
        }
    }

    match command {
        "start" => Some(Command::Start),
        "fxr" => Some(Command::Fxr(words.next().map(str::to_string))),
        _ => None,
    }
}

pub fn route(text: &str, requester: RequesterId, operator: RequesterId, bot_username: Option<&str>) -> Action {
    let Some(command) = parse_command(text, bot_username) else {
        return Action::Ignore;
    };

    if requester != operator {
        return Action::Reply(UNAUTHORIZED_TEXT.to_string());
    }

    match command {
        Command::Start => Action::Reply(WELCOME_TEXT.to_string()),
        Command::Fxr(None) => Action::Reply(USAGE_TEXT.to_string()),
        Command::Fxr(Some(name)) => Action::StartFlow { name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATOR: RequesterId = 1001;
    const BOT: Option<&str> = Some("FxrBot");

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/start", BOT), Some(Command::Start));
        assert_eq!(parse_command("/fxr alice", BOT), Some(Command::Fxr(Some("alice".to_string()))));
        assert_eq!(parse_command("/fxr@FxrBot  bob extra", BOT), Some(Command::Fxr(Some("bob".to_string()))));
        assert_eq!(parse_command("/fxr", BOT), Some(Command::Fxr(None)));
        assert_eq!(parse_command("/help", BOT), None);
        assert_eq!(parse_command("fxr alice", BOT), None);
        assert_eq!(parse_command("", BOT), None);
    }

    #[test]
    fn test_commands_for_other_bots_ignored() {
        assert_eq!(parse_command("/fxr@OtherBot bob", BOT), None);
        assert_eq!(parse_command("/start@OtherBot", BOT), None);
        assert_eq!(parse_command("/fxr@fxrbot bob", BOT), Some(Command::Fxr(Some("bob".to_string()))));
        assert_eq!(route("/fxr@OtherBot bob", OPERATOR, OPERATOR, BOT), Action::Ignore);

        // own username unknown: addressee not checked
        assert_eq!(parse_command("/fxr@OtherBot bob", None), Some(Command::Fxr(Some("bob".to_string()))));
    }

    #[test]
    fn test_operator_routes() {
        assert_eq!(route("/start", OPERATOR, OPERATOR, BOT), Action::Reply(WELCOME_TEXT.to_string()));
        assert_eq!(route("/fxr", OPERATOR, OPERATOR, BOT), Action::Reply("Usage: /fxr <username>".to_string()));
        assert_eq!(
            route("/fxr user1", OPERATOR, OPERATOR, BOT),
            Action::StartFlow { name: "user1".to_string() }
        );
    }

    #[test]
    fn test_unauthorized_checked_before_arguments() {
        assert_eq!(route("/start", 5, OPERATOR, BOT), Action::Reply("🚫 Unauthorized.".to_string()));
        assert_eq!(route("/fxr", 5, OPERATOR, BOT), Action::Reply("🚫 Unauthorized.".to_string()));
        assert_eq!(route("/fxr alice", 5, OPERATOR, BOT), Action::Reply("🚫 Unauthorized.".to_string()));
    }

    #[test]
    fn test_plain_text_ignored() {
        assert_eq!(route("hello", OPERATOR, OPERATOR, BOT), Action::Ignore);
        assert_eq!(route("/unknown", 5, OPERATOR, BOT), Action::Ignore);
    }
}
