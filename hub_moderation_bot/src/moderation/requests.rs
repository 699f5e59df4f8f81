use base64::{engine::general_purpose::STANDARD, Engine};
use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, MessageId};

use super::render;
use crate::{
    callback::{edit_moderation_keyboard, moderation_keyboard},
    error::ModerationError,
    hub::Hub,
    short_id::get_or_create_short_id,
    types::ArticleId,
};

/// Get the image out of a `data:<type>;base64,<data>` URL.
fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (header, data) = url.strip_prefix("data:")?.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(data.trim()).ok()
}

/// Send an article with approve and reject buttons to `chat` and remember
/// the message on the article.
///
/// Articles with an inline image are sent as that photo with the text as
/// the caption.
pub async fn send_moderation_request<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    article_id: ArticleId,
) -> Result<MessageId, ModerationError> {
    let article = hub
        .db
        .get_article(article_id)
        .await?
        .ok_or(ModerationError::ArticleNotFound(article_id))?;
    let author = hub.db.get_profile(article.author_id).await?;
    let token = get_or_create_short_id(&hub.db, article.id).await;

    let text = render::moderation_request(&article, author.as_ref());
    let keyboard = moderation_keyboard(&token);

    let photo = article.media_url.as_deref().and_then(decode_data_url);
    let sent_photo = match photo {
        Some(photo) => match hub
            .admin_bot
            .send_photo(chat, photo, &text, Some(keyboard.clone()))
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                // Captions are much shorter than messages, among other things.
                log::warn!("Failed to send article {article_id} as a photo, sending text: {e}");
                None
            }
        },
        None => None,
    };

    let message = match sent_photo {
        Some(message) => message,
        None => hub.admin_bot.send_text(chat, &text, Some(keyboard)).await?,
    };

    hub.db.set_moderation_message(article.id, message).await?;
    log::debug!("Sent moderation request for article {article_id} with token {token}");
    Ok(message)
}

/// Send the pending edit of an article with approve and reject buttons to
/// `chat`.
pub async fn send_edit_moderation_request<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    article_id: ArticleId,
) -> Result<MessageId, ModerationError> {
    let article = hub
        .db
        .get_article(article_id)
        .await?
        .ok_or(ModerationError::ArticleNotFound(article_id))?;
    let Some(edit) = &article.pending_edit else {
        return Err(ModerationError::NoPendingEdit(article_id));
    };
    let author = hub.db.get_profile(article.author_id).await?;
    let token = get_or_create_short_id(&hub.db, article.id).await;

    let text = render::edit_request(&article, edit, author.as_ref());
    let message = hub
        .admin_bot
        .send_text(chat, &text, Some(edit_moderation_keyboard(&token)))
        .await?;

    log::debug!("Sent edit moderation request for article {article_id} with token {token}");
    Ok(message)
}
