//! Inline button presses in the admin bot.

use hub_bot_commons::messenger::Messenger;
use teloxide::{
    types::{CallbackQueryId, ChatId, MessageId, UserId},
    RequestError,
};

use crate::{
    admin,
    callback::{Ack, CallbackAction},
    error::ModerationError,
    hub::Hub,
    moderation::{self, Origin},
    premium, support,
};

pub const ACCESS_DENIED: &str = "⛔ Access denied.";
pub const INVALID_BUTTON: &str = "⚠️ This button is invalid.";

/// A button press, stripped down to what routing needs.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub query_id: CallbackQueryId,
    pub actor: UserId,
    /// Chat and message of the button, if Telegram still has them.
    pub chat_id: Option<ChatId>,
    pub message_id: Option<MessageId>,
    pub payload: Option<String>,
}

async fn dispatch<M: Messenger>(
    hub: &Hub<M>,
    event: &CallbackEvent,
    action: CallbackAction,
) -> Result<Ack, ModerationError> {
    let origin = Origin {
        chat: event.chat_id.unwrap_or(hub.admin_chat),
        message: event.message_id,
    };
    let actor = event.actor;

    match action {
        CallbackAction::Approve(token) => moderation::approve(hub, actor, origin, &token).await,
        CallbackAction::Reject(token) => {
            moderation::open_rejection(hub, actor, origin, &token).await
        }
        CallbackAction::EditApprove(token) => {
            moderation::approve_edit(hub, actor, origin, &token).await
        }
        CallbackAction::EditReject(token) => {
            moderation::reject_edit(hub, actor, origin, &token).await
        }
        CallbackAction::Users { page } => {
            admin::users_page(hub, origin.chat, origin.message, page).await?;
            Ok(Ack::Silent)
        }
        CallbackAction::PremiumGrant(user) => premium::grant(hub, origin, user).await,
        CallbackAction::PremiumRevoke(user) => premium::revoke(hub, origin, user).await,
        CallbackAction::PremiumExtend(user) => premium::extend(hub, origin, user).await,
        CallbackAction::Question(prefix) => support::show_question(hub, origin.chat, &prefix).await,
        CallbackAction::Unknown => Ok(Ack::Silent),
    }
}

/// Decide what a button press means and answer it exactly once.
pub async fn route_callback<M: Messenger>(
    hub: &Hub<M>,
    event: CallbackEvent,
) -> Result<(), RequestError> {
    let ack = if !hub.is_admin(event.actor) {
        log::info!("Denied a button press from {}", event.actor);
        Ack::toast(ACCESS_DENIED)
    } else {
        match event.payload.as_deref().unwrap_or("").parse::<CallbackAction>() {
            Err(e) => {
                log::info!("Got an invalid button from {}: {e}", event.actor);
                Ack::toast(INVALID_BUTTON)
            }
            Ok(action) => {
                log::debug!("{} pressed {action}", event.actor);
                match dispatch(hub, &event, action).await {
                    Ok(ack) => ack,
                    Err(e) => {
                        if e.is_internal() {
                            log::error!("Failed to handle a button from {}: {e}", event.actor);
                        } else {
                            log::info!("Button from {} went nowhere: {e}", event.actor);
                        }
                        Ack::toast(e.toast())
                    }
                }
            }
        }
    };

    hub.admin_bot
        .answer_callback(event.query_id, ack.text())
        .await
}
