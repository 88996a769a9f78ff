//! Minimal Telegram Bot API client: long polling plus the three calls the
//! bot needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::bot::{BotAction, ChatSink};
use crate::types::{NewsError, Result};

pub const API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Extra client-side time on top of the poll wait.
const POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat the update came from, if any.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|query| query.message.as_ref())
            .map(|message| message.chat.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
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

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    pub fn single(button: InlineKeyboardButton) -> Self {
        Self::new(vec![vec![button]])
    }

    /// Every button's callback data, row by row.
    pub fn callback_data(&self) -> Vec<&str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| button.callback_data.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub struct BotApi {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BotApi {
    pub fn new(token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", API_BASE, token),
            request_timeout: Duration::from_secs(timeout_seconds),
        })
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_seconds: u64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_seconds,
            "allowed_updates": ["message", "callback_query"],
        });
        let wait = Duration::from_secs(timeout_seconds + POLL_GRACE_SECS);
        self.call("getUpdates", &body, wait).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = message_body(text, keyboard);
        body["chat_id"] = json!(chat_id);
        let _: Value = self.call("sendMessage", &body, self.request_timeout).await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = message_body(text, keyboard);
        body["chat_id"] = json!(chat_id);
        body["message_id"] = json!(message_id);
        let _: Value = self.call("editMessageText", &body, self.request_timeout).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let body = json!({ "callback_query_id": callback_query_id });
        let _: Value = self
            .call("answerCallbackQuery", &body, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value, timeout: Duration) -> Result<T> {
        debug!("Telegram call {}", method);
        // Request URLs carry the bot token, so errors are reported without them.
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NewsError::NetworkTimeout {
                        url: format!("telegram {}", method),
                    }
                } else {
                    NewsError::Telegram(format!("{} failed: {}", method, e.without_url()))
                }
            })?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| NewsError::Telegram(format!("{} returned unreadable body: {}", method, e.without_url())))?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(NewsError::Telegram(format!(
                "{} rejected: {}",
                method,
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

fn message_body(text: &str, keyboard: Option<&InlineKeyboardMarkup>) -> Value {
    let mut body = json!({
        "text": text,
        "parse_mode": "HTML",
        "link_preview_options": { "is_disabled": true },
    });
    if let Some(keyboard) = keyboard {
        body["reply_markup"] = json!(keyboard);
    }
    body
}

#[async_trait]
impl ChatSink for BotApi {
    async fn perform(&self, action: BotAction) -> Result<()> {
        match action {
            BotAction::Send {
                chat_id,
                text,
                keyboard,
            } => self.send_message(chat_id, &text, keyboard.as_ref()).await,
            BotAction::Edit {
                chat_id,
                message_id,
                text,
                keyboard,
            } => {
                self.edit_message_text(chat_id, message_id, &text, keyboard.as_ref())
                    .await
            }
            BotAction::AnswerCallback { callback_id } => self.answer_callback_query(&callback_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_and_callback_updates() {
        let raw = r#"[
            {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 55, "type": "private"},
              "from": {"id": 77, "is_bot": false, "first_name": "A"}, "text": "/start"}},
            {"update_id": 11, "callback_query": {"id": "cb1", "from": {"id": 77, "is_bot": false, "first_name": "A"},
              "message": {"message_id": 2, "chat": {"id": 55}}, "data": "source_bbc"}}
        ]"#;
        let updates: Vec<Update> = serde_json::from_str(raw).unwrap();

        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/start"));
        assert_eq!(updates[0].chat_id(), Some(55));
        let query = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(query.data.as_deref(), Some("source_bbc"));
        assert_eq!(updates[1].chat_id(), Some(55));
    }

    #[test]
    fn keyboard_serializes_only_set_fields() {
        let keyboard = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("More", "show_premium"),
            InlineKeyboardButton::link("Pay", "https://example.com"),
        ]]);
        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            value,
            json!({"inline_keyboard": [[
                {"text": "More", "callback_data": "show_premium"},
                {"text": "Pay", "url": "https://example.com"}
            ]]})
        );
    }

    #[test]
    fn message_body_uses_html_mode() {
        let body = message_body("<b>hi</b>", None);
        assert_eq!(body["parse_mode"], "HTML");
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn rejected_call_keeps_description() {
        let envelope: ApiResponse<Value> =
            serde_json::from_str(r#"{"ok": false, "description": "Bad Request: chat not found"}"#).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.description.as_deref(), Some("Bad Request: chat not found"));
    }
}
