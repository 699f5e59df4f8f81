//! Support questions: asked through the user bot, shown in the admin chat,
//! answered by replying to them there.

use html_escape::encode_text;
use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    callback::{questions_keyboard, Ack},
    database::SupportQuestion,
    error::ModerationError,
    hub::Hub,
    notify::{notify_admin_channel, notify_author, notify_chat},
    types::truncate_chars,
};

/// How many questions `/questions` lists.
pub const QUESTIONS_LIMIT: i64 = 20;

/// Store a question from a user and let the admins know.
pub async fn ask<M: Messenger>(
    hub: &Hub<M>,
    user: UserId,
    question: &str,
) -> Result<SupportQuestion, sqlx::Error> {
    let profile = hub.db.get_profile_by_telegram_id(user).await?;
    let stored = hub
        .db
        .insert_support_question(user, profile.as_ref().map(|x| x.id), question)
        .await?;

    let asker = match &profile {
        Some(profile) => profile.display_name(),
        None => format!("user {user}"),
    };
    let text = format!(
        "❓ <b>New support question</b> from {}:\n\n{}\n\n<i>Open it, then reply to it to answer.</i>",
        encode_text(&asker),
        encode_text(truncate_chars(question, 300)),
    );
    let keyboard = questions_keyboard(std::slice::from_ref(&stored));
    notify_admin_channel(hub, &text, Some(keyboard)).await;

    log::info!("Support question {} from {user}", stored.id);
    Ok(stored)
}

/// `/questions`: the unanswered questions as buttons.
pub async fn list_questions<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
) -> Result<(), ModerationError> {
    let questions = hub.db.list_pending_questions(QUESTIONS_LIMIT).await?;
    if questions.is_empty() {
        notify_chat(&hub.admin_bot, chat, "✅ No unanswered questions.", None).await;
        return Ok(());
    }

    let text = format!(
        "❓ <b>Support questions ({}):</b>\n\n<i>Press a question to open it, then reply to it to answer.</i>",
        questions.len()
    );
    notify_chat(
        &hub.admin_bot,
        chat,
        &text,
        Some(questions_keyboard(&questions)),
    )
    .await;
    Ok(())
}

/// `question:<prefix>`: show the full question in `chat`. A reply to that
/// message is taken as the answer.
pub async fn show_question<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    prefix: &str,
) -> Result<Ack, ModerationError> {
    let question = hub
        .db
        .find_pending_question_by_prefix(prefix)
        .await?
        .ok_or(ModerationError::QuestionNotFound)?;
    let profile = hub.db.get_profile_by_telegram_id(question.user).await?;

    let asker = match &profile {
        Some(profile) => encode_text(&profile.display_name()).into_owned(),
        None => "a user without a profile".to_string(),
    };
    let text = format!(
        "❓ <b>Question #{}</b>\n\n👤 <b>From:</b> {asker}\n🆔 <b>Telegram ID:</b> <code>{}</code>\n\n📝 <b>Question:</b>\n{}\n\n🕐 {}\n\n<i>Reply to this message to answer.</i>",
        question.short_id(),
        question.user,
        encode_text(&question.question),
        question.created_at.format("%Y-%m-%d %H:%M UTC"),
    );

    let message = hub.admin_bot.send_text(chat, &text, None).await?;
    hub.db
        .set_question_admin_message(question.id, message)
        .await?;
    Ok(Ack::Silent)
}

/// Treat `answer` as the answer to the question shown in `replied_to`.
/// Returns `false` if that message isn't an unanswered question.
pub async fn answer_by_reply<M: Messenger>(
    hub: &Hub<M>,
    admin: UserId,
    chat: ChatId,
    replied_to: MessageId,
    answer: &str,
) -> Result<bool, sqlx::Error> {
    let Some(question) = hub
        .db
        .find_pending_question_by_admin_message(replied_to)
        .await?
    else {
        return Ok(false);
    };

    if !hub.db.answer_question(question.id, answer, admin).await? {
        // Answered in the meantime. Still ours to consume.
        notify_chat(
            &hub.admin_bot,
            chat,
            "This question was already answered.",
            None,
        )
        .await;
        return Ok(true);
    }

    let text = format!(
        "💬 <b>Answer from support</b>\n\n<b>Your question:</b>\n{}\n\n<b>Answer:</b>\n{}\n\n<i>Have more questions? Ask again with /ask.</i>",
        encode_text(&question.question),
        encode_text(answer),
    );
    let confirmation = match notify_author(hub, question.user, &text).await {
        true => "✅ Answer sent to the user.",
        false => "⚠️ Answer saved, but the user could not be reached.",
    };
    notify_chat(&hub.admin_bot, chat, confirmation, None).await;

    log::info!("Support question {} answered by {admin}", question.id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::{
        callback::CallbackAction,
        testing::{insert_profile, test_hub, Sent, ADMIN, ADMIN_CHAT},
    };

    #[tokio::test]
    async fn ask_show_answer() {
        let hub = test_hub().await;
        insert_profile(&hub.db, 42).await;

        let question = ask(&hub, UserId(42), "Where are my <posts>?").await.unwrap();
        assert!(question.user_profile_id.is_some());
        let to_admin = hub.admin_bot.texts_to(ADMIN_CHAT);
        assert_eq!(to_admin.len(), 1);
        assert!(to_admin[0].contains("&lt;posts&gt;"));
        let Some(Sent::Text {
            keyboard: Some(keyboard),
            ..
        }) = hub.admin_bot.sent().last().cloned()
        else {
            panic!("the ping should come with a button");
        };
        let opens = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .map(|x| x.kind.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            opens,
            [InlineKeyboardButtonKind::CallbackData(
                CallbackAction::Question(question.short_id()).to_string()
            )]
        );

        let ack = show_question(&hub, ADMIN_CHAT, &question.short_id())
            .await
            .unwrap();
        assert_eq!(ack, Ack::Silent);
        let Some(Sent::Text { id: shown, .. }) = hub.admin_bot.sent().last().cloned() else {
            panic!("question should be shown");
        };

        // Not a reply to the question.
        assert!(!answer_by_reply(&hub, ADMIN, ADMIN_CHAT, MessageId(1), "hm")
            .await
            .unwrap());

        assert!(answer_by_reply(&hub, ADMIN, ADMIN_CHAT, shown, "Right here")
            .await
            .unwrap());
        let to_user = hub.user_bot.texts_to(ChatId(42));
        assert_eq!(to_user.len(), 1);
        assert!(to_user[0].contains("Right here"));

        let answered = hub
            .db
            .find_pending_question_by_admin_message(shown)
            .await
            .unwrap();
        assert!(answered.is_none());
        assert!(hub.db.list_pending_questions(10).await.unwrap().is_empty());

        // Can't be opened again once answered.
        let result = show_question(&hub, ADMIN_CHAT, &question.short_id()).await;
        assert!(matches!(result, Err(ModerationError::QuestionNotFound)));
    }

    #[tokio::test]
    async fn question_without_profile() {
        let hub = test_hub().await;
        let question = ask(&hub, UserId(7), "Hello?").await.unwrap();
        assert_eq!(question.user_profile_id, None);

        list_questions(&hub, ADMIN_CHAT).await.unwrap();
        let Some(Sent::Text { keyboard, .. }) = hub.admin_bot.sent().last().cloned() else {
            panic!("question list should be sent");
        };
        assert_eq!(keyboard.unwrap().inline_keyboard.len(), 1);
    }
}
