use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};
use teloxide::types::{MessageId, UserId};
use uuid::Uuid;

use super::{decode, Error};
use crate::types::{
    ArticleId, ArticleStatus, EditPayload, MediaType, ModerationAction, ModerationTarget,
    QuestionStatus, ShortId,
};

/// Telegram user IDs are u64, but sqlite only does i64. They fit.
#[allow(clippy::cast_possible_wrap)]
pub(super) fn user_id_to_db(id: UserId) -> i64 {
    id.0 as i64
}

#[allow(clippy::cast_sign_loss)]
pub(super) fn user_id_from_db(id: i64) -> UserId {
    UserId(id as u64)
}

/// A user of the Mini App.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub telegram_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub reputation: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub(super) const COLUMNS: &'static str = "id, telegram_id, username, first_name, last_name, \
        avatar_url, is_premium, premium_expires_at, reputation, created_at, updated_at";

    pub(super) fn from_row(row: &SqliteRow) -> Result<Profile, Error> {
        Ok(Profile {
            id: decode(Uuid::parse_str(row.try_get("id")?))?,
            telegram_id: user_id_from_db(row.try_get("telegram_id")?),
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            avatar_url: row.try_get("avatar_url")?,
            is_premium: row.try_get("is_premium")?,
            premium_expires_at: row.try_get("premium_expires_at")?,
            reputation: row.try_get("reputation")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Pretty name for messages, not HTML-escaped.
    #[must_use]
    pub fn display_name(&self) -> String {
        hub_bot_commons::names::person_prettyprint(
            self.username.as_deref(),
            Some(self.first_name.as_str()),
            self.last_name.as_deref(),
            None,
        )
    }
}

/// Data for creating or refreshing a profile from a Mini App session.
#[derive(Debug, Clone)]
pub struct ProfileUpsert {
    pub telegram_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// An article as stored.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: ArticleId,
    pub author_id: Uuid,
    pub category_id: Option<String>,
    pub title: String,
    pub body: String,
    pub preview: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_anonymous: bool,
    pub allow_comments: bool,
    pub status: ArticleStatus,
    pub rejection_reason: Option<String>,
    pub pending_edit: Option<EditPayload>,
    #[serde(skip)]
    pub telegram_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub(super) const COLUMNS: &'static str = "id, author_id, category_id, title, body, preview, \
        media_url, media_type, is_anonymous, allow_comments, status, rejection_reason, \
        pending_edit, telegram_message_id, created_at";

    pub(super) fn from_row(row: &SqliteRow) -> Result<Article, Error> {
        let media_type: Option<String> = row.try_get("media_type")?;
        let pending_edit: Option<String> = row.try_get("pending_edit")?;
        Ok(Article {
            id: decode(row.try_get::<&str, _>("id")?.parse())?,
            author_id: decode(Uuid::parse_str(row.try_get("author_id")?))?,
            category_id: row.try_get("category_id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            preview: row.try_get("preview")?,
            media_url: row.try_get("media_url")?,
            media_type: decode(media_type.as_deref().map(str::parse).transpose())?,
            is_anonymous: row.try_get("is_anonymous")?,
            allow_comments: row.try_get("allow_comments")?,
            status: decode(row.try_get::<&str, _>("status")?.parse())?,
            rejection_reason: row.try_get("rejection_reason")?,
            pending_edit: decode(
                pending_edit
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose(),
            )?,
            telegram_message_id: row
                .try_get::<Option<i32>, _>("telegram_message_id")?
                .map(MessageId),
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for a freshly submitted article. It always starts out pending.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub author_id: Uuid,
    pub category_id: Option<String>,
    pub title: String,
    pub body: String,
    pub preview: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_anonymous: bool,
    pub allow_comments: bool,
}

/// Article counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl ArticleCounts {
    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}

/// An admin pressed "reject" on an article and is yet to send the reason.
#[derive(Debug, Clone)]
pub struct PendingRejection {
    pub id: i64,
    pub admin: UserId,
    pub article_id: ArticleId,
    pub short_id: String,
    pub created_at: DateTime<Utc>,
}

impl PendingRejection {
    pub(super) fn from_row(row: &SqliteRow) -> Result<PendingRejection, Error> {
        Ok(PendingRejection {
            id: row.try_get("id")?,
            admin: user_id_from_db(row.try_get("admin_telegram_id")?),
            article_id: decode(row.try_get::<&str, _>("article_id")?.parse())?,
            short_id: row.try_get("short_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A new entry for the moderation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub article_id: ArticleId,
    pub moderator: UserId,
    pub action: ModerationAction,
    pub target: ModerationTarget,
    pub reason: Option<String>,
}

/// An entry of the moderation log.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: i64,
    pub article_id: ArticleId,
    pub moderator: UserId,
    pub action: ModerationAction,
    pub target: ModerationTarget,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
impl LogEntry {
    pub(super) fn from_row(row: &SqliteRow) -> Result<LogEntry, Error> {
        Ok(LogEntry {
            id: row.try_get("id")?,
            article_id: decode(row.try_get::<&str, _>("article_id")?.parse())?,
            moderator: user_id_from_db(row.try_get("moderator_telegram_id")?),
            action: decode(row.try_get::<&str, _>("action")?.parse())?,
            target: decode(row.try_get::<&str, _>("target")?.parse())?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A question sent to support through the user bot.
#[derive(Debug, Clone)]
pub struct SupportQuestion {
    pub id: Uuid,
    pub user: UserId,
    pub user_profile_id: Option<Uuid>,
    pub question: String,
    pub status: QuestionStatus,
    pub admin_message_id: Option<MessageId>,
    pub answer: Option<String>,
    pub answered_by: Option<UserId>,
    pub answered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SupportQuestion {
    pub(super) const COLUMNS: &'static str = "id, user_telegram_id, user_profile_id, question, \
        status, admin_message_id, answer, answered_by_telegram_id, answered_at, created_at";

    pub(super) fn from_row(row: &SqliteRow) -> Result<SupportQuestion, Error> {
        let user_profile_id: Option<String> = row.try_get("user_profile_id")?;
        Ok(SupportQuestion {
            id: decode(Uuid::parse_str(row.try_get("id")?))?,
            user: user_id_from_db(row.try_get("user_telegram_id")?),
            user_profile_id: decode(
                user_profile_id
                    .as_deref()
                    .map(Uuid::parse_str)
                    .transpose(),
            )?,
            question: row.try_get("question")?,
            status: decode(row.try_get::<&str, _>("status")?.parse())?,
            admin_message_id: row
                .try_get::<Option<i32>, _>("admin_message_id")?
                .map(MessageId),
            answer: row.try_get("answer")?,
            answered_by: row
                .try_get::<Option<i64>, _>("answered_by_telegram_id")?
                .map(user_id_from_db),
            answered_at: row.try_get("answered_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// The short form of the ID used in callback payloads and headers.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.id.simple().to_string();
        id.truncate(ShortId::LEN);
        id
    }
}
