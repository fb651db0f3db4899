use contest_reminder_libs::{
    contest::Platform,
    telegram::model::{InlineKeyboardButton, ReplyMarkup},
};

pub const UPCOMING_CONTESTS: &str = "🎯 Upcoming Contests";
pub const SETTINGS: &str = "⚙️ Settings";
pub const MY_SUBSCRIPTIONS: &str = "📊 My Subscriptions";

pub fn main_menu() -> ReplyMarkup {
    ReplyMarkup::keyboard(&[&[UPCOMING_CONTESTS], &[SETTINGS], &[MY_SUBSCRIPTIONS]])
}

pub fn settings() -> ReplyMarkup {
    ReplyMarkup::inline(vec![
        vec![
            InlineKeyboardButton::new("⏰ Reminder Time", "set_reminder"),
            InlineKeyboardButton::new("🎯 Platforms", "set_platforms"),
        ],
        vec![
            InlineKeyboardButton::new("✅ Subscribe", "subscribe"),
            InlineKeyboardButton::new("❌ Unsubscribe", "unsubscribe"),
        ],
        vec![InlineKeyboardButton::new("🔙 Back to Main Menu", "main_menu")],
    ])
}

pub fn reminder() -> ReplyMarkup {
    ReplyMarkup::inline(vec![
        [12, 24, 48]
            .into_iter()
            .map(|hours| {
                InlineKeyboardButton::new(&format!("{} Hours", hours), &format!("remind_{}", hours))
            })
            .collect(),
        vec![back_to_settings()],
    ])
}

pub fn platforms() -> ReplyMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Platform::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|platform| {
                    InlineKeyboardButton::new(
                        &platform.to_string(),
                        &format!("platform_{}", platform.short_code()),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![back_to_settings()]);
    ReplyMarkup::inline(rows)
}

fn back_to_settings() -> InlineKeyboardButton {
    InlineKeyboardButton::new("🔙 Back to Settings", "back_settings")
}
