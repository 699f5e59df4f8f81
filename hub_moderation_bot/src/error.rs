use teloxide::{types::UserId, RequestError};

use crate::types::{ArticleId, ShortId};

/// Something that stopped a moderation or admin action.
///
/// Resolution failures never happen after a write, so the state is exactly
/// as it was before the action.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("short ID {0} is not registered")]
    UnknownShortId(ShortId),
    #[error("article {0} does not exist")]
    ArticleNotFound(ArticleId),
    #[error("article {0} has no pending edit")]
    NoPendingEdit(ArticleId),
    #[error("user {0} does not exist")]
    UserNotFound(UserId),
    #[error("support question not found")]
    QuestionNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("telegram error: {0}")]
    Telegram(#[from] RequestError),
}

impl ModerationError {
    /// Text for the toast shown to the admin who pressed the button.
    #[must_use]
    pub fn toast(&self) -> &'static str {
        match self {
            ModerationError::UnknownShortId(_) | ModerationError::ArticleNotFound(_) => {
                "❌ Article not found."
            }
            ModerationError::NoPendingEdit(_) => "Nothing to do: there is no pending edit.",
            ModerationError::UserNotFound(_) => "❌ User not found.",
            ModerationError::QuestionNotFound => "❌ Question not found.",
            ModerationError::Database(_) | ModerationError::Telegram(_) => {
                "❌ Something went wrong. Try again later."
            }
        }
    }

    /// Whether this is our problem rather than a stale button or a typo.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ModerationError::Database(_) | ModerationError::Telegram(_)
        )
    }
}
