use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, info, warn};

use trialbot_core::config::AppConfig;
use trialbot_registration::SignupFlow;

use crate::dispatch::{route, Action};
use crate::telegram::{TelegramClient, TelegramNotifier, Update};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-poll Telegram until Ctrl+C; each `/fxr` runs as its own task
pub async fn run(config: AppConfig) -> Result<()> {
    config.validate_telegram()?;
    let operator = config
        .telegram
        .admin_id
        .context("telegram admin id missing")?;

    let flow = Arc::new(SignupFlow::from_config(&config, operator)?);
    let client = Arc::new(TelegramClient::new(&config.telegram)?);

    // without it, commands addressed to any bot are accepted
    let bot_username = match client.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            warn!("getMe failed, not checking command addressees: {}", e);
            None
        }
    };

    info!(operator, bot = bot_username.as_deref().unwrap_or("-"), "bot started, press Ctrl+C to stop");

    let mut offset: Option<i64> = None;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            updates = client.get_updates(offset) => match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        handle_update(update, &client, &flow, bot_username.as_deref()).await;
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    Ok(())
}

async fn handle_update(
    update: Update,
    client: &Arc<TelegramClient>,
    flow: &Arc<SignupFlow>,
    bot_username: Option<&str>,
) {
    let Some(message) = update.message else {
        return;
    };
    let (Some(text), Some(from)) = (message.text, message.from) else {
        return;
    };
    let chat_id = message.chat.id;

    match route(&text, from.id, flow.operator(), bot_username) {
        Action::Ignore => debug!(chat_id, "ignoring non-command message"),
        Action::Reply(reply) => {
            if let Err(e) = client.send_message(chat_id, &reply).await {
                warn!(chat_id, "reply failed: {}", e);
            }
        }
        Action::StartFlow { name } => {
            info!(
                chat_id,
                user = from.username.as_deref().unwrap_or("-"),
                name = %name,
                "starting signup flow"
            );
            let flow = flow.clone();
            let notifier = TelegramNotifier::new(client.clone(), chat_id);
            let requester = from.id;
            tokio::spawn(async move {
                let outcome = flow.run(requester, &name, &notifier).await;
                info!(chat_id, ?outcome, "signup flow done");
            });
        }
    }
}
