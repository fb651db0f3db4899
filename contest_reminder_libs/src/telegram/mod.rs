//! Minimal Telegram Bot API client: long polling, sending and editing messages.
pub mod model;

use crate::{dispatcher::Messenger, error::DeliveryError, subscription::UserId};
use async_trait::async_trait;
use model::{ReplyMarkup, TelegramResponse, Update, User};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

type Result<T> = std::result::Result<T, TelegramError>;

/// Seconds the server may hold a `getUpdates` request open.
pub const LONG_POLL_TIMEOUT: u64 = 30;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("failed to request to telegram bot api")]
    RequestError(#[from] reqwest::Error),
    #[error("invalid bot api url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("telegram bot api error: {0}")]
    ApiError(String),
}

pub struct TelegramClient {
    base_url: Url,
    client: Client,
}

impl TelegramClient {
    pub fn new(token: &str, client: Client) -> Result<Self> {
        Self::with_api_url("https://api.telegram.org", token, client)
    }

    pub fn with_api_url(api_url: &str, token: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(api_url)?.join(&format!("bot{}/", token))?;
        Ok(Self { base_url, client })
    }

    fn method_url(&self, method: &str) -> Result<Url> {
        Ok(self.base_url.join(method)?)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let res = self
            .client
            .post(self.method_url(method)?)
            .json(body)
            .send()
            .await?;
        let response: TelegramResponse<T> = res.json().await?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            (_, _) => Err(TelegramError::ApiError(format!(
                "{} failed cause [{}]",
                method,
                response.description.unwrap_or_default()
            ))),
        }
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup).unwrap_or(Value::Null);
        }
        let _: Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup).unwrap_or(Value::Null);
        }
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str, text: &str) -> Result<()> {
        let _: Value = self
            .call(
                "answerCallbackQuery",
                &json!({
                    "callback_query_id": callback_query_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, user_id: UserId, text: &str) -> std::result::Result<(), DeliveryError> {
        let body = json!({
            "chat_id": user_id,
            "text": text,
        });
        match self.call::<Value>("sendMessage", &body).await {
            Ok(_) => Ok(()),
            Err(TelegramError::RequestError(e)) => Err(DeliveryError::RequestError(e)),
            Err(e) => Err(DeliveryError::Rejected {
                user_id,
                reason: e.to_string(),
            }),
        }
    }
}
