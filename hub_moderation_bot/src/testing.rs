//! Test doubles: a messenger that writes everything down and a hub built
//! around an in-memory database.

#![allow(clippy::unwrap_used)]

use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Mutex,
};

use hub_bot_commons::messenger::Messenger;
use teloxide::{
    types::{CallbackQueryId, ChatId, InlineKeyboardMarkup, MessageId, UserId},
    ApiError, RequestError,
};

use crate::{
    database::{Article, Database, NewArticle, Profile, ProfileUpsert},
    hub::Hub,
    types::derive_preview,
};

pub const ADMIN: UserId = UserId(1);
pub const ADMIN_CHAT: ChatId = ChatId(1);

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
        id: MessageId,
    },
    Photo {
        chat: ChatId,
        bytes: Vec<u8>,
        caption: String,
        keyboard: Option<InlineKeyboardMarkup>,
        id: MessageId,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    ClearKeyboard {
        chat: ChatId,
        message: MessageId,
    },
    Answer {
        query: CallbackQueryId,
        toast: Option<String>,
    },
}

/// Writes down every successful call. Message IDs count up from 1000.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    last_id: AtomicI32,
    failing: AtomicBool,
}

impl RecordingMessenger {
    /// Make every following call fail like a user that blocked the bot.
    pub fn fail_everything(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts and captions sent to `chat`, in order.
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|x| match x {
                Sent::Text { chat: c, text, .. } if c == chat => Some(text),
                Sent::Photo {
                    chat: c, caption, ..
                } if c == chat => Some(caption),
                _ => None,
            })
            .collect()
    }

    /// Toasts of all answered callback queries, in order.
    pub fn answers(&self) -> Vec<Option<String>> {
        self.sent()
            .into_iter()
            .filter_map(|x| match x {
                Sent::Answer { toast, .. } => Some(toast),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<(), RequestError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RequestError::Api(ApiError::BotBlocked));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }

    fn next_id(&self) -> MessageId {
        MessageId(1000 + self.last_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, RequestError> {
        let id = self.next_id();
        self.record(Sent::Text {
            chat,
            text: text.to_string(),
            keyboard,
            id,
        })?;
        Ok(id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, RequestError> {
        let id = self.next_id();
        self.record(Sent::Photo {
            chat,
            bytes: photo,
            caption: caption.to_string(),
            keyboard,
            id,
        })?;
        Ok(id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), RequestError> {
        self.record(Sent::Edit {
            chat,
            message,
            text: text.to_string(),
            keyboard,
        })
    }

    async fn clear_keyboard(&self, chat: ChatId, message: MessageId) -> Result<(), RequestError> {
        self.record(Sent::ClearKeyboard { chat, message })
    }

    async fn answer_callback(
        &self,
        query: CallbackQueryId,
        toast: Option<&str>,
    ) -> Result<(), RequestError> {
        self.record(Sent::Answer {
            query,
            toast: toast.map(str::to_string),
        })
    }
}

pub async fn test_hub() -> Hub<RecordingMessenger> {
    Hub::new(
        Database::new("sqlite::memory:").await.unwrap(),
        RecordingMessenger::default(),
        RecordingMessenger::default(),
        ADMIN,
        ADMIN_CHAT,
    )
}

pub async fn insert_profile(db: &Database, telegram_id: u64) -> Profile {
    db.upsert_profile(&ProfileUpsert {
        telegram_id: UserId(telegram_id),
        username: Some(format!("user{telegram_id}")),
        first_name: "Test".to_string(),
        last_name: None,
        avatar_url: None,
    })
    .await
    .unwrap()
}

/// A plain pending article with body "Body text".
pub async fn insert_article(db: &Database, author: &Profile, title: &str) -> Article {
    db.insert_article(&NewArticle {
        author_id: author.id,
        category_id: None,
        title: title.to_string(),
        body: "Body text".to_string(),
        preview: derive_preview(None, "Body text"),
        media_url: None,
        media_type: None,
        is_anonymous: false,
        allow_comments: true,
    })
    .await
    .unwrap()
}
