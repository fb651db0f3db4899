use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: &str, callback_data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: callback_data.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
}

impl ReplyMarkup {
    pub fn keyboard(rows: &[&[&str]]) -> Self {
        ReplyMarkup::Keyboard {
            keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton {
                            text: text.to_string(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        }
    }

    pub fn inline(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        ReplyMarkup::Inline {
            inline_keyboard: rows,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialize_updates() {
        let body = serde_json::json!({
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 1,
                        "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
                        "chat": {"id": 42, "type": "private"},
                        "date": 1710493200,
                        "text": "/start"
                    }
                },
                {
                    "update_id": 11,
                    "callback_query": {
                        "id": "abc",
                        "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
                        "message": {
                            "message_id": 2,
                            "chat": {"id": 42, "type": "private"},
                            "date": 1710493200,
                            "text": "Settings"
                        },
                        "chat_instance": "1",
                        "data": "remind_12"
                    }
                }
            ]
        });

        let response: TelegramResponse<Vec<Update>> = serde_json::from_value(body).unwrap();
        let updates = response.result.unwrap();

        assert!(response.ok);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        let callback = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(callback.data.as_deref(), Some("remind_12"));
        assert_eq!(callback.message.as_ref().unwrap().message_id, 2);
    }

    #[test]
    fn test_serialize_markup() {
        let keyboard = ReplyMarkup::keyboard(&[&["A"], &["B", "C"]]);
        let inline = ReplyMarkup::inline(vec![vec![InlineKeyboardButton::new("12 Hours", "remind_12")]]);

        assert_eq!(
            serde_json::to_value(keyboard).unwrap(),
            serde_json::json!({
                "keyboard": [[{"text": "A"}], [{"text": "B"}, {"text": "C"}]],
                "resize_keyboard": true
            })
        );
        assert_eq!(
            serde_json::to_value(inline).unwrap(),
            serde_json::json!({
                "inline_keyboard": [[{"text": "12 Hours", "callback_data": "remind_12"}]]
            })
        );
    }
}
