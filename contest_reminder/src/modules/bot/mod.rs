pub mod handler;
pub mod keyboard;

use contest_reminder_libs::telegram::{model::Update, TelegramClient, TelegramError};
use handler::{BotAction, BotHandler};
use std::sync::Arc;
use tokio::{
    sync::watch,
    time::{self, Duration},
};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Long-polling loop answering chat commands and button presses.
pub struct Bot {
    telegram: Arc<TelegramClient>,
    handler: Arc<BotHandler>,
}

impl Bot {
    pub fn new(telegram: Arc<TelegramClient>, handler: BotHandler) -> Self {
        Self {
            telegram,
            handler: Arc::new(handler),
        }
    }

    /// Poll and answer updates until `shutdown` turns true or its sender goes away.
    ///
    /// Contest listings are answered from their own task so the poll loop keeps serving
    /// other users while sources are fetched.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Telegram bot started.");
        let mut offset = 0i64;

        while !*shutdown.borrow() {
            let updates = tokio::select! {
                updates = self.telegram.get_updates(offset) => updates,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!("failed to get updates: {:?}", e);
                    time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if BotHandler::needs_fetch(&update) {
                    let telegram = self.telegram.clone();
                    let handler = self.handler.clone();
                    tokio::spawn(async move { respond(&telegram, &handler, &update).await });
                } else {
                    respond(&self.telegram, &self.handler, &update).await;
                }
            }
        }

        tracing::info!("Telegram bot stopped.");
    }
}

async fn respond(telegram: &TelegramClient, handler: &BotHandler, update: &Update) {
    match handler.handle_update(update).await {
        Ok(actions) => {
            for action in actions {
                if let Err(e) = perform(telegram, &action).await {
                    tracing::error!("failed to reply to update {}: {:?}", update.update_id, e);
                }
            }
        }
        Err(e) => tracing::error!("failed to handle update {}: {:?}", update.update_id, e),
    }
}

async fn perform(telegram: &TelegramClient, action: &BotAction) -> Result<(), TelegramError> {
    match action {
        BotAction::Send {
            chat_id,
            text,
            markup,
        } => telegram.send_message(*chat_id, text, markup.as_ref()).await,
        BotAction::Edit {
            chat_id,
            message_id,
            text,
            markup,
        } => {
            telegram
                .edit_message_text(*chat_id, *message_id, text, markup.as_ref())
                .await
        }
        BotAction::Answer { callback_id, text } => {
            telegram.answer_callback_query(callback_id, text).await
        }
    }
}
