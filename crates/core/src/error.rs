use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("config error: {0}")]
    Config(String),

    #[error("telegram error: {0}")]
    Telegram(String),

    #[error("http error: {0}")]
    Http(String),
}
