//! Free text from the admin: the answer to a support question, the reason
//! for a rejection, or neither.

use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    error::ModerationError, hub::Hub, moderation::complete_rejection, notify::notify_chat,
    support::answer_by_reply,
};

pub const HELP_HINT: &str = "Use /help to see what I can do.";

/// A text message that isn't a command.
#[derive(Debug, Clone)]
pub struct TextEvent {
    pub actor: UserId,
    pub chat_id: ChatId,
    pub text: String,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
}

/// Find out what an admin's text is for, and do that. A reply to a shown
/// support question comes first, then an open rejection.
pub async fn correlate<M: Messenger>(hub: &Hub<M>, event: &TextEvent) -> Result<(), ModerationError> {
    if let Some(reply_to) = event.reply_to {
        if answer_by_reply(hub, event.actor, event.chat_id, reply_to, &event.text).await? {
            return Ok(());
        }
    }

    if complete_rejection(hub, event.actor, event.chat_id, &event.text).await? {
        return Ok(());
    }

    notify_chat(&hub.admin_bot, event.chat_id, HELP_HINT, None).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{
        moderation::{open_rejection, Origin},
        short_id::get_or_create_short_id,
        support::{ask, show_question},
        testing::{insert_article, insert_profile, test_hub, Sent, ADMIN, ADMIN_CHAT},
        types::ArticleStatus,
    };

    fn text(text: &str, reply_to: Option<MessageId>) -> TextEvent {
        TextEvent {
            actor: ADMIN,
            chat_id: ADMIN_CHAT,
            text: text.to_string(),
            reply_to,
        }
    }

    #[tokio::test]
    async fn support_reply_wins_over_rejection() {
        let hub = test_hub().await;
        let author = insert_profile(&hub.db, 555).await;
        let article = insert_article(&hub.db, &author, "Test").await;
        let token = get_or_create_short_id(&hub.db, article.id).await;

        let question = ask(&hub, UserId(555), "Why so slow?").await.unwrap();
        show_question(&hub, ADMIN_CHAT, &question.short_id())
            .await
            .unwrap();
        let Some(Sent::Text { id: shown, .. }) = hub.admin_bot.sent().last().cloned() else {
            panic!("question should be shown");
        };

        let origin = Origin {
            chat: ADMIN_CHAT,
            message: Some(MessageId(10)),
        };
        open_rejection(&hub, ADMIN, origin, &token).await.unwrap();

        correlate(&hub, &text("Busy week", Some(shown))).await.unwrap();

        // The question got the answer, the rejection is still waiting.
        assert!(hub.db.list_pending_questions(10).await.unwrap().is_empty());
        assert_eq!(hub.db.pending_rejections_of(ADMIN).await.unwrap().len(), 1);
        let pending = hub.db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(pending.status, ArticleStatus::Pending);

        // A plain message is the reason.
        correlate(&hub, &text("Off topic", None)).await.unwrap();
        let rejected = hub.db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, ArticleStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Off topic"));
    }

    #[tokio::test]
    async fn reply_to_something_else_is_a_reason() {
        let hub = test_hub().await;
        let author = insert_profile(&hub.db, 555).await;
        let article = insert_article(&hub.db, &author, "Test").await;
        let token = get_or_create_short_id(&hub.db, article.id).await;
        let origin = Origin {
            chat: ADMIN_CHAT,
            message: None,
        };
        open_rejection(&hub, ADMIN, origin, &token).await.unwrap();

        correlate(&hub, &text("Spam", Some(MessageId(3)))).await.unwrap();
        let rejected = hub.db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, ArticleStatus::Rejected);
    }

    #[tokio::test]
    async fn otherwise_a_hint() {
        let hub = test_hub().await;
        correlate(&hub, &text("hello?", None)).await.unwrap();
        assert_eq!(hub.admin_bot.texts_to(ADMIN_CHAT), [HELP_HINT]);
    }
}
