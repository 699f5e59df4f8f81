//! Best-effort outbound messages.
//!
//! None of these fail to the caller. Whatever they were sent about has
//! already happened and stays done even if nobody hears of it.

use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, UserId};

use crate::hub::Hub;

/// Send a message to any chat once, logging a failure.
pub async fn notify_chat<M: Messenger>(
    messenger: &M,
    chat: ChatId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Option<MessageId> {
    match messenger.send_text(chat, text, keyboard).await {
        Ok(message) => Some(message),
        Err(e) => {
            log::warn!("Failed to send a message to {chat}: {e}");
            None
        }
    }
}

/// Tell a user something through the user bot.
pub async fn notify_author<M: Messenger>(hub: &Hub<M>, user: UserId, text: &str) -> bool {
    notify_chat(&hub.user_bot, ChatId::from(user), text, None)
        .await
        .is_some()
}

/// Post to the admin chat through the admin bot.
pub async fn notify_admin_channel<M: Messenger>(
    hub: &Hub<M>,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Option<MessageId> {
    notify_chat(&hub.admin_bot, hub.admin_chat, text, keyboard).await
}

/// Take the buttons off a message in an admin chat so they can't be
/// pressed again.
pub async fn strip_keyboard<M: Messenger>(hub: &Hub<M>, chat: ChatId, message: MessageId) {
    if let Err(e) = hub.admin_bot.clear_keyboard(chat, message).await {
        log::warn!("Failed to remove keyboard from message {} in {chat}: {e}", message.0);
    }
}
