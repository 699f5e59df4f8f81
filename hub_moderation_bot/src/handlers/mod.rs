use std::sync::Arc;

use hub_bot_commons::messenger::Messenger;
use teloxide::{
    types::{CallbackQuery, ChatId, Me, Message},
    RequestError,
};

use crate::{
    admin,
    error::ModerationError,
    hub::Hub,
    notify::notify_chat,
    support,
};

pub mod commands;
pub mod correlator;
pub mod router;
pub mod user_bot;

use commands::{parse_command, Command, CommandKind};
use correlator::{correlate, TextEvent};
use router::{route_callback, CallbackEvent, ACCESS_DENIED};

const START_TEXT: &str = concat!(
    "👋 Hi! New articles and support questions will show up here.\n\n",
    "Send /help for the list of commands."
);

async fn run_command<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    kind: CommandKind,
    params: &str,
) -> Result<(), ModerationError> {
    match kind {
        CommandKind::Start => {
            notify_chat(&hub.admin_bot, chat, START_TEXT, None).await;
        }
        CommandKind::Help => {
            notify_chat(&hub.admin_bot, chat, &Command::generate_help(), None).await;
        }
        CommandKind::Stats => admin::stats(hub, chat).await?,
        CommandKind::Users => admin::users_page(hub, chat, None, 0).await?,
        CommandKind::Search => admin::search(hub, chat, params).await?,
        CommandKind::Premium => admin::premium_overview(hub, chat).await?,
        CommandKind::Pending => admin::pending(hub, chat).await?,
        CommandKind::Questions => support::list_questions(hub, chat).await?,
        CommandKind::Broadcast => {
            admin::broadcast(hub, chat, params).await?;
        }
    }
    Ok(())
}

/// Handle a text message sent to the admin bot.
///
/// Strangers get turned away. In group chats they're only answered when
/// they try a command, so the admin chat can have other people in it.
pub async fn handle_admin_text<M: Messenger>(
    hub: &Hub<M>,
    event: TextEvent,
    is_private: bool,
    bot_username: Option<&str>,
) {
    let command = parse_command(&event.text, bot_username);

    if !hub.is_admin(event.actor) {
        if command.is_some() || is_private {
            log::info!("Denied a message from {}", event.actor);
            notify_chat(&hub.admin_bot, event.chat_id, ACCESS_DENIED, None).await;
        }
        return;
    }

    let result = match command {
        Some((kind, params)) => {
            log::debug!("Admin command {kind:?} in {}", event.chat_id);
            run_command(hub, event.chat_id, kind, params).await
        }
        None => correlate(hub, &event).await,
    };

    if let Err(e) = result {
        if e.is_internal() {
            log::error!("Failed to handle a message from the admin: {e}");
        } else {
            log::info!("Admin message went nowhere: {e}");
        }
        notify_chat(&hub.admin_bot, event.chat_id, e.toast(), None).await;
    }
}

pub async fn handle_admin_message(
    message: Message,
    me: Me,
    hub: Arc<Hub>,
) -> Result<(), RequestError> {
    let (Some(user), Some(text)) = (&message.from, message.text()) else {
        return Ok(());
    };

    let event = TextEvent {
        actor: user.id,
        chat_id: message.chat.id,
        text: text.to_string(),
        reply_to: message.reply_to_message().map(|x| x.id),
    };
    handle_admin_text(&hub, event, message.chat.is_private(), Some(me.username())).await;
    Ok(())
}

pub async fn handle_callback_query(query: CallbackQuery, hub: Arc<Hub>) -> Result<(), RequestError> {
    let event = CallbackEvent {
        query_id: query.id,
        actor: query.from.id,
        chat_id: query.message.as_ref().map(|x| x.chat().id),
        message_id: query.message.as_ref().map(|x| x.id()),
        payload: query.data,
    };
    route_callback(&hub, event).await
}

pub async fn handle_user_message(
    message: Message,
    me: Me,
    hub: Arc<Hub>,
) -> Result<(), RequestError> {
    // Only private chats; the user bot has nothing to say in groups.
    if !message.chat.is_private() {
        return Ok(());
    }
    let (Some(user), Some(text)) = (&message.from, message.text()) else {
        return Ok(());
    };

    if let Err(e) =
        user_bot::handle_user_text(&hub, user.id, message.chat.id, text, Some(me.username())).await
    {
        log::error!("Failed to store a question from {}: {e}", user.id);
        notify_chat(
            &hub.user_bot,
            message.chat.id,
            "❌ Something went wrong. Try again later.",
            None,
        )
        .await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::UserId;

    use super::*;
    use crate::testing::{insert_profile, test_hub, ADMIN, ADMIN_CHAT};

    fn text(actor: UserId, text: &str) -> TextEvent {
        TextEvent {
            actor,
            chat_id: ADMIN_CHAT,
            text: text.to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn strangers_are_denied() {
        let hub = test_hub().await;
        insert_profile(&hub.db, 100).await;

        handle_admin_text(&hub, text(UserId(100), "/broadcast hi"), false, None).await;
        // Chatter in a group is left alone.
        handle_admin_text(&hub, text(UserId(100), "lol"), false, None).await;

        assert_eq!(hub.admin_bot.texts_to(ADMIN_CHAT), [ACCESS_DENIED]);
        assert!(hub.user_bot.sent().is_empty());
    }

    #[tokio::test]
    async fn admin_commands_run() {
        let hub = test_hub().await;
        insert_profile(&hub.db, 100).await;

        handle_admin_text(&hub, text(ADMIN, "/broadcast hi"), true, None).await;
        assert_eq!(hub.user_bot.texts_to(ChatId(100)).len(), 1);

        handle_admin_text(&hub, text(ADMIN, "/help"), true, None).await;
        let replies = hub.admin_bot.texts_to(ADMIN_CHAT);
        assert!(replies.last().unwrap().contains("/pending"));
    }

    #[tokio::test]
    async fn plain_text_gets_a_hint() {
        let hub = test_hub().await;
        handle_admin_text(&hub, text(ADMIN, "some text"), true, None).await;
        assert_eq!(hub.admin_bot.texts_to(ADMIN_CHAT), [correlator::HELP_HINT]);
    }
}
