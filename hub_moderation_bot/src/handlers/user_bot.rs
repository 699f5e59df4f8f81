//! The bot article authors talk to. It only takes support questions;
//! everything else happens in the Mini App.

use hub_bot_commons::messenger::Messenger;
use teloxide::types::{BotCommand, ChatId, UserId};

use super::commands::split_command;
use crate::{hub::Hub, notify::notify_chat, support::ask};

pub const USER_HELP: &str = concat!(
    "👋 Hi! This bot delivers news about your articles.\n\n",
    "Have a question for the admins? Send it like this:\n",
    "<code>/ask How do I add a picture?</code>"
);

/// Longest question accepted, in characters.
const MAX_QUESTION_LEN: usize = 2000;

#[must_use]
pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("ask", "ask the admins a question"),
        BotCommand::new("help", "how to use this bot"),
    ]
}

/// Handle any text sent to the user bot.
pub async fn handle_user_text<M: Messenger>(
    hub: &Hub<M>,
    user: UserId,
    chat: ChatId,
    text: &str,
    bot_username: Option<&str>,
) -> Result<(), sqlx::Error> {
    let question = match split_command(text, bot_username) {
        Some((callname, params)) if callname.eq_ignore_ascii_case("/ask") => params.trim(),
        _ => {
            notify_chat(&hub.user_bot, chat, USER_HELP, None).await;
            return Ok(());
        }
    };

    if question.is_empty() {
        notify_chat(
            &hub.user_bot,
            chat,
            "Write the question right after the command:\n<code>/ask How do I add a picture?</code>",
            None,
        )
        .await;
        return Ok(());
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        let text = format!("That's too long, please keep it under {MAX_QUESTION_LEN} characters.");
        notify_chat(&hub.user_bot, chat, &text, None).await;
        return Ok(());
    }

    ask(hub, user, question).await?;
    notify_chat(
        &hub.user_bot,
        chat,
        "✅ Your question was sent. The answer will come here.",
        None,
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testing::{test_hub, ADMIN_CHAT};

    #[tokio::test]
    async fn asking() {
        let hub = test_hub().await;
        let chat = ChatId(42);

        handle_user_text(&hub, UserId(42), chat, "hello", None)
            .await
            .unwrap();
        handle_user_text(&hub, UserId(42), chat, "/ask", None)
            .await
            .unwrap();
        assert!(hub.db.list_pending_questions(10).await.unwrap().is_empty());

        handle_user_text(&hub, UserId(42), chat, "/ask@HubBot Is it on?", Some("hubbot"))
            .await
            .unwrap();
        let questions = hub.db.list_pending_questions(10).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Is it on?");

        let replies = hub.user_bot.texts_to(chat);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], USER_HELP);
        assert_eq!(hub.admin_bot.texts_to(ADMIN_CHAT).len(), 1);
    }
}
