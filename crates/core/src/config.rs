use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::BotError;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub mailbox: MailboxConfig,
    pub matcher: MatcherConfig,
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub poller: PollerConfig,
    pub flow: FlowConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// The single operator allowed to issue commands.
    pub admin_id: Option<i64>,
    pub api_base: String,
    pub long_poll_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_id: None,
            api_base: "https://api.telegram.org".to_string(),
            long_poll_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MailboxConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_domain: String,
    /// Lowercased requested name -> mailbox domain.
    pub domain_map: HashMap<String, String>,
    pub request_timeout_seconds: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        let domain_map = [("user1", "domain1.snv.email"), ("user2", "domain2.snv.email")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            api_base: "https://api.testmail.app".to_string(),
            api_key: String::new(),
            default_domain: "snv.email".to_string(),
            domain_map,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    pub product_name: String,
    pub confirmation_phrase: String,
    pub relay_fragment: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            product_name: "fx replay".to_string(),
            confirmation_phrase: "confirm your email".to_string(),
            relay_fragment: "mandrillapp.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub password: String,
    pub card_number: String,
    pub card_expiry: String,
    pub card_cvv: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fxreplay.com".to_string(),
            password: "Asdf@123".to_string(),
            card_number: "4242424242424242".to_string(),
            card_expiry: "01/28".to_string(),
            card_cvv: "050".to_string(),
        }
    }
}

impl SiteConfig {
    /// Resolve a fixed site path against the configured base URL.
    pub fn page_url(&self, path: &str) -> Result<Url, BotError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| BotError::Config(format!("invalid site.base_url {}: {}", self.base_url, e)))?;
        base.join(path)
            .map_err(|e| BotError::Config(format!("invalid site path {}: {}", path, e)))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub navigation_timeout_seconds: u64,
    pub username_error_timeout_seconds: u64,
    pub dashboard_timeout_seconds: u64,
    pub server_select_timeout_seconds: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            navigation_timeout_seconds: 30,
            username_error_timeout_seconds: 5,
            dashboard_timeout_seconds: 15,
            server_select_timeout_seconds: 10,
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_seconds)
    }

    pub fn username_error_timeout(&self) -> Duration {
        Duration::from_secs(self.username_error_timeout_seconds)
    }

    pub fn dashboard_timeout(&self) -> Duration {
        Duration::from_secs(self.dashboard_timeout_seconds)
    }

    pub fn server_select_timeout(&self) -> Duration {
        Duration::from_secs(self.server_select_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollerConfig {
    pub deadline_seconds: u64,
    pub interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: 180,
            interval_seconds: 5,
        }
    }
}

impl PollerConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FlowConfig {
    /// Browser sessions allowed at once. 1 means single-flight.
    pub max_concurrent_sessions: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 1,
        }
    }
}

impl AppConfig {
    /// Apply environment overrides on top of the file values.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = lookup("ADMIN_TELEGRAM_ID") {
            let id = v
                .trim()
                .parse::<i64>()
                .map_err(|_| BotError::Config(format!("ADMIN_TELEGRAM_ID is not an integer: {}", v)))?;
            self.telegram.admin_id = Some(id);
        }
        if let Some(v) = lookup("TESTMAIL_API_KEY") {
            self.mailbox.api_key = v;
        }
        if let Some(v) = lookup("MAILBOX_API_BASE") {
            self.mailbox.api_base = v;
        }
        if let Some(v) = lookup("SITE_BASE_URL") {
            self.site.base_url = v;
        }
        if let Some(v) = lookup("CHROME_PATH") {
            self.browser.chrome_path = Some(v);
        }
        if let Some(v) = lookup("POLL_DEADLINE_SECONDS") {
            match v.trim().parse::<u64>() {
                Ok(n) if n > 0 => self.poller.deadline_seconds = n,
                _ => warn!(value = %v, "ignoring POLL_DEADLINE_SECONDS, expected a positive integer"),
            }
        }
        Ok(())
    }

    /// Settings every flow needs, with or without the chat surface.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.mailbox.api_key.is_empty() {
            return Err(BotError::Config("mailbox api key missing (TESTMAIL_API_KEY)".to_string()));
        }
        if self.poller.interval_seconds == 0 {
            return Err(BotError::Config("poller.interval_seconds must be > 0".to_string()));
        }
        if self.flow.max_concurrent_sessions == 0 {
            return Err(BotError::Config("flow.max_concurrent_sessions must be > 0".to_string()));
        }
        self.site.page_url("/")?;
        Ok(())
    }

    /// Extra settings needed to run the Telegram bot.
    pub fn validate_telegram(&self) -> Result<(), BotError> {
        self.validate()?;
        if self.telegram.bot_token.is_empty() {
            return Err(BotError::Config("telegram bot token missing (TELEGRAM_BOT_TOKEN)".to_string()));
        }
        if self.telegram.admin_id.is_none() {
            return Err(BotError::Config("telegram admin id missing (ADMIN_TELEGRAM_ID)".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings_and_domains() {
        let config = AppConfig::default();
        assert_eq!(config.poller.deadline(), Duration::from_secs(180));
        assert_eq!(config.poller.interval(), Duration::from_secs(5));
        assert_eq!(config.mailbox.default_domain, "snv.email");
        assert_eq!(
            config.mailbox.domain_map.get("user1").map(String::as_str),
            Some("domain1.snv.email")
        );
        assert_eq!(config.flow.max_concurrent_sessions, 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [mailbox]
            default_domain = "example.test"

            [mailbox.domain_map]
            bob = "bob.example.test"

            [poller]
            deadline_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.mailbox.default_domain, "example.test");
        assert_eq!(config.mailbox.domain_map.len(), 1);
        assert_eq!(config.poller.deadline_seconds, 60);
        assert_eq!(config.poller.interval_seconds, 5);
        assert_eq!(config.site.base_url, "https://fxreplay.com");
    }

    #[test]
    fn test_shipped_config_parses() {
        let config: AppConfig = toml::from_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.mailbox.domain_map.len(), 2);
        assert_eq!(config.poller.deadline(), Duration::from_secs(180));
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = AppConfig::default();
        config.telegram.bot_token = "from-file".to_string();

        let env: HashMap<&str, &str> = [
            ("TELEGRAM_BOT_TOKEN", "from-env"),
            ("ADMIN_TELEGRAM_ID", "12345"),
            ("TESTMAIL_API_KEY", "key"),
            ("POLL_DEADLINE_SECONDS", "90"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "from-env");
        assert_eq!(config.telegram.admin_id, Some(12345));
        assert_eq!(config.mailbox.api_key, "key");
        assert_eq!(config.poller.deadline_seconds, 90);
        assert!(config.validate_telegram().is_ok());
    }

    #[test]
    fn test_bad_admin_id_is_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(|k| (k == "ADMIN_TELEGRAM_ID").then(|| "not-a-number".to_string()))
            .unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_validate_reports_missing_secrets() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.mailbox.api_key = "key".to_string();
        assert!(config.validate().is_ok());
        assert!(config.validate_telegram().is_err());
    }

    #[test]
    fn test_page_url_joins_paths() {
        let site = SiteConfig::default();
        assert_eq!(site.page_url("/signup").unwrap().as_str(), "https://fxreplay.com/signup");
    }
}
