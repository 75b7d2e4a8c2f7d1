/// Telegram Bot API over plain HTTPS: long-polled getUpdates and sendMessage
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use trialbot_core::config::TelegramConfig;
use trialbot_core::BotError;
use trialbot_registration::Notifier;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Telegram(format!(
                "{} failed: {}",
                method,
                self.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
    long_poll: Duration,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, BotError> {
        let long_poll = Duration::from_secs(config.long_poll_seconds);

        // the request must outlive the server-side long poll
        let http_client = reqwest::Client::builder()
            .timeout(long_poll + Duration::from_secs(10))
            .build()
            .map_err(|e| BotError::Http(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            long_poll,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// The bot's own account, for matching `/command@username`
    pub async fn get_me(&self) -> Result<User, BotError> {
        let response = self
            .http_client
            .post(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        let parsed: ApiResponse<User> = response
            .json()
            .await
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        parsed.into_result("getMe")
    }

    /// Updates after `offset`, waiting up to the long-poll period for one
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, BotError> {
        let body = GetUpdates {
            offset,
            timeout: self.long_poll.as_secs(),
            allowed_updates: ["message"],
        };

        let response = self
            .http_client
            .post(self.method_url("getUpdates"))
            .json(&body)
            .send()
            .await
            // reqwest errors carry the URL, which carries the token
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        let parsed: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        let updates = parsed.into_result("getUpdates")?;
        debug!(count = updates.len(), "received updates");
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        let parsed: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BotError::Http(e.without_url().to_string()))?;

        parsed.into_result("sendMessage").map(|_| ())
    }
}

/// Sends flow messages to one chat
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        if let Err(e) = self.client.send_message(self.chat_id, text).await {
            warn!(chat_id = self.chat_id, "could not deliver message: {}", e);
        }
    }
}
