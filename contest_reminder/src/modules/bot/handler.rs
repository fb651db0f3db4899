use crate::modules::bot::keyboard;
use anyhow::{Context, Result};
use chrono::Utc;
use contest_reminder_libs::{
    aggregator::Aggregator,
    contest::Platform,
    message::{format_platform_selection, format_subscription_status, format_upcoming_contests},
    subscription::{Subscription, SubscriptionStore, UserId},
    telegram::model::{CallbackQuery, Message, ReplyMarkup, Update},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{str::FromStr, sync::Arc};

static REMIND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^remind_(\d+)$").unwrap());
static PLATFORM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^platform_(.+)$").unwrap());

const WELCOME: &str = "👋 *Welcome to the Coding Contest Reminder Bot!*\n\n\
    I'll help you stay updated with upcoming coding contests.\n\
    Use the buttons below to navigate:";
const SETTINGS: &str = "*⚙️ Contest Reminder Settings*\n\n\
    Configure your preferences:\n\
    • Set reminder timing\n\
    • Choose contest platforms\n\
    • Manage subscription";

/// Something the bot should do in reply to an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotAction {
    Send {
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Answer {
        callback_id: String,
        text: String,
    },
}

/// Data carried by an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    SetReminder,
    SetPlatforms,
    Subscribe,
    Unsubscribe,
    MainMenu,
    BackSettings,
    Remind(i32),
    TogglePlatform(Option<Platform>),
}

impl FromStr for Callback {
    type Err = String;

    fn from_str(data: &str) -> std::result::Result<Self, Self::Err> {
        let callback = match data {
            "set_reminder" => Callback::SetReminder,
            "set_platforms" => Callback::SetPlatforms,
            "subscribe" => Callback::Subscribe,
            "unsubscribe" => Callback::Unsubscribe,
            "main_menu" => Callback::MainMenu,
            "back_settings" => Callback::BackSettings,
            _ => {
                if let Some(captures) = REMIND_RE.captures(data) {
                    let hours = captures[1]
                        .parse::<i32>()
                        .map_err(|_| data.to_string())?;
                    Callback::Remind(hours)
                } else if let Some(captures) = PLATFORM_RE.captures(data) {
                    Callback::TogglePlatform(Platform::from_short_code(&captures[1]))
                } else {
                    return Err(data.to_string());
                }
            }
        };
        Ok(callback)
    }
}

/// Turns chat updates into store changes and replies.
pub struct BotHandler {
    store: Arc<dyn SubscriptionStore>,
    aggregator: Arc<Aggregator>,
}

impl BotHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, aggregator: Arc<Aggregator>) -> Self {
        Self { store, aggregator }
    }

    /// Whether handling the update fetches contests from every source.
    pub fn needs_fetch(update: &Update) -> bool {
        update
            .message
            .as_ref()
            .and_then(|message| message.text.as_deref())
            .map_or(false, |text| {
                matches!(text.trim(), "/contests" | keyboard::UPCOMING_CONTESTS)
            })
    }

    pub async fn handle_update(&self, update: &Update) -> Result<Vec<BotAction>> {
        if let Some(query) = &update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = &update.message {
            return self.handle_message(message).await;
        }
        Ok(Vec::new())
    }

    pub async fn handle_message(&self, message: &Message) -> Result<Vec<BotAction>> {
        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map_or(chat_id, |user| user.id);
        let Some(text) = message.text.as_deref() else {
            return Ok(Vec::new());
        };

        let (text, markup) = match text.trim() {
            "/start" => (WELCOME.to_string(), Some(keyboard::main_menu())),
            "/contests" | keyboard::UPCOMING_CONTESTS => {
                let contests = self.aggregator.collect(Utc::now()).await;
                (format_upcoming_contests(&contests), None)
            }
            "/settings" | keyboard::SETTINGS => (SETTINGS.to_string(), Some(keyboard::settings())),
            keyboard::MY_SUBSCRIPTIONS => {
                let subscription = self.store.get(user_id).await?;
                (format_subscription_status(subscription.as_ref()), None)
            }
            _ => return Ok(Vec::new()),
        };

        Ok(vec![BotAction::Send {
            chat_id,
            text,
            markup,
        }])
    }

    /// Handle a button press. The query is always answered, also when the store fails.
    pub async fn handle_callback(&self, query: &CallbackQuery) -> Result<Vec<BotAction>> {
        let user_id = query.from.id;
        let data = query.data.as_deref().unwrap_or_default();
        let callback = match data.parse::<Callback>() {
            Ok(callback) => callback,
            Err(data) => {
                tracing::warn!("unknown callback data {} from user {}", data, user_id);
                return Ok(vec![answer(query, "Invalid selection!")]);
            }
        };

        match self.apply_callback(query, callback).await {
            Ok(actions) => Ok(actions),
            Err(e) => {
                tracing::error!("failed to handle callback {} of user {}: {:?}", data, user_id, e);
                Ok(vec![answer(
                    query,
                    "⚠️ Something went wrong. Please try again later.",
                )])
            }
        }
    }

    async fn apply_callback(
        &self,
        query: &CallbackQuery,
        callback: Callback,
    ) -> Result<Vec<BotAction>> {
        let user_id = query.from.id;
        let mut actions = Vec::new();
        let (text, markup) = match callback {
            Callback::SetReminder => (
                String::from(
                    "*⏰ Choose Reminder Time*\n\n\
                    How many hours before the contest would you like to be reminded?",
                ),
                keyboard::reminder(),
            ),
            Callback::SetPlatforms => {
                let subscription = self.store.get(user_id).await?;
                (
                    format!(
                        "*🎯 Platform Selection*\n\nCurrent platforms:\n{}\n\n\
                        Click on a platform to toggle selection:",
                        format_platform_selection(subscription.as_ref())
                    ),
                    keyboard::platforms(),
                )
            }
            Callback::Subscribe => {
                let subscription = self
                    .store
                    .get(user_id)
                    .await?
                    .unwrap_or_else(|| Subscription::new(user_id));
                self.store
                    .upsert(
                        user_id,
                        &subscription.platforms,
                        subscription.reminder_lead_hours,
                        true,
                    )
                    .await
                    .with_context(|| format!("failed to subscribe user {}", user_id))?;
                tracing::info!("User {} subscribed.", user_id);

                actions.push(answer(query, "✅ Successfully subscribed to contest reminders!"));
                (
                    String::from(
                        "*✅ Subscription Status*\n\n\
                        You are now subscribed to contest reminders!\n\
                        Use the buttons below to customize your preferences.",
                    ),
                    keyboard::settings(),
                )
            }
            Callback::Unsubscribe => {
                self.store
                    .unsubscribe(user_id)
                    .await
                    .with_context(|| format!("failed to unsubscribe user {}", user_id))?;
                tracing::info!("User {} unsubscribed.", user_id);

                actions.push(answer(query, "❌ Successfully unsubscribed from contest reminders!"));
                (
                    String::from(
                        "*❌ Subscription Status*\n\n\
                        You are now unsubscribed from contest reminders.\n\
                        You can resubscribe at any time using the Subscribe button.",
                    ),
                    keyboard::settings(),
                )
            }
            Callback::MainMenu => {
                actions.push(answer(query, "🔙 Main menu"));
                actions.push(BotAction::Send {
                    chat_id: user_id,
                    text: WELCOME.to_string(),
                    markup: Some(keyboard::main_menu()),
                });
                return Ok(actions);
            }
            Callback::BackSettings => (SETTINGS.to_string(), keyboard::settings()),
            Callback::Remind(hours) => {
                if hours <= 0 {
                    return Ok(vec![answer(query, "Invalid selection!")]);
                }
                let subscription = self
                    .store
                    .get(user_id)
                    .await?
                    .unwrap_or_else(|| Subscription::new(user_id));
                self.store
                    .upsert(
                        user_id,
                        &subscription.platforms,
                        hours,
                        subscription.is_subscribed,
                    )
                    .await
                    .with_context(|| format!("failed to update lead time of user {}", user_id))?;

                actions.push(answer(query, &format!("✅ Reminders set to {} hours!", hours)));
                (
                    format!(
                        "*⏰ Reminder Settings Updated*\n\n\
                        You will be notified {} hours before contests start.",
                        hours
                    ),
                    keyboard::settings(),
                )
            }
            Callback::TogglePlatform(None) => {
                return Ok(vec![answer(query, "Invalid platform selection!")]);
            }
            Callback::TogglePlatform(Some(platform)) => {
                let mut subscription = self.store.get(user_id).await?.unwrap_or(Subscription {
                    platforms: Default::default(),
                    ..Subscription::new(user_id)
                });
                let status = if subscription.platforms.remove(&platform) {
                    "removed from"
                } else {
                    subscription.platforms.insert(platform);
                    "added to"
                };
                self.store
                    .upsert(
                        user_id,
                        &subscription.platforms,
                        subscription.reminder_lead_hours,
                        subscription.is_subscribed,
                    )
                    .await
                    .with_context(|| format!("failed to update platforms of user {}", user_id))?;

                actions.push(answer(
                    query,
                    &format!("✅ {} {} your platforms!", platform, status),
                ));
                (
                    format!(
                        "*🎯 Platform Selection*\n\nYour current platforms:\n{}",
                        format_platform_selection(Some(&subscription))
                    ),
                    keyboard::platforms(),
                )
            }
        };

        actions.push(edit(query, user_id, text, markup));
        Ok(actions)
    }
}

fn answer(query: &CallbackQuery, text: &str) -> BotAction {
    BotAction::Answer {
        callback_id: query.id.clone(),
        text: text.to_string(),
    }
}

/// Replace the message carrying the pressed button, or send a new one when it's gone.
fn edit(query: &CallbackQuery, user_id: UserId, text: String, markup: ReplyMarkup) -> BotAction {
    match &query.message {
        Some(message) => BotAction::Edit {
            chat_id: message.chat.id,
            message_id: message.message_id,
            text,
            markup: Some(markup),
        },
        None => BotAction::Send {
            chat_id: user_id,
            text,
            markup: Some(markup),
        },
    }
}
