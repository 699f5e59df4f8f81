//! What the admin commands do, apart from parsing them.

use std::fmt::Write;

use html_escape::encode_text;
use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, MessageId};

use crate::{
    callback::{premium_keyboard, stats_keyboard, users_keyboard},
    error::ModerationError,
    hub::Hub,
    moderation::send_moderation_request,
    notify::{notify_author, notify_chat},
    premium::profile_card,
};

/// Users shown on one page of `/users`.
pub const USERS_PER_PAGE: i64 = 10;
/// Premium users shown by `/premium`.
pub const PREMIUM_LIST_LIMIT: i64 = 10;
/// Articles sent out by `/pending`.
pub const PENDING_LIMIT: i64 = 10;

/// Result of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastTally {
    pub sent: usize,
    pub failed: usize,
}

/// `/stats`.
pub async fn stats<M: Messenger>(hub: &Hub<M>, chat: ChatId) -> Result<(), ModerationError> {
    let users = hub.db.count_profiles().await?;
    let premium = hub.db.count_premium_profiles().await?;
    let articles = hub.db.article_status_counts().await?;

    let text = format!(
        "📊 <b>Statistics</b>\n\n👥 Users: {users}\n👑 Premium: {premium}\n\n📝 Articles: {}\n⏳ Pending: {}\n✅ Approved: {}\n❌ Rejected: {}",
        articles.total(),
        articles.pending,
        articles.approved,
        articles.rejected,
    );
    hub.admin_bot
        .send_text(chat, &text, Some(stats_keyboard()))
        .await?;
    Ok(())
}

/// A page of the user list. With `edit` set, that message is replaced
/// instead of sending a new one.
pub async fn users_page<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    edit: Option<MessageId>,
    page: u32,
) -> Result<(), ModerationError> {
    let total = hub.db.count_profiles().await?;
    let offset = i64::from(page) * USERS_PER_PAGE;
    let profiles = hub.db.list_profiles(offset, USERS_PER_PAGE).await?;
    let has_next = offset + USERS_PER_PAGE < total;

    let mut text = format!("👥 <b>Users</b> ({total} total, page {})\n", u64::from(page) + 1);
    if profiles.is_empty() {
        text.push_str("\nNobody here.");
    }
    for (number, profile) in (offset + 1..).zip(&profiles) {
        let crown = if profile.is_premium { " 👑" } else { "" };
        let _ = write!(
            text,
            "\n{number}. {}{crown} · <code>{}</code>",
            encode_text(&profile.display_name()),
            profile.telegram_id,
        );
    }

    let keyboard = users_keyboard(page, has_next);
    match edit {
        Some(message) => {
            hub.admin_bot
                .edit_text(chat, message, &text, Some(keyboard))
                .await?;
        }
        None => {
            hub.admin_bot.send_text(chat, &text, Some(keyboard)).await?;
        }
    }
    Ok(())
}

/// `/search <username or telegram id>`: one card per match, each with
/// premium buttons.
pub async fn search<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    query: &str,
) -> Result<(), ModerationError> {
    let query = query.trim().trim_start_matches('@');
    if query.is_empty() {
        notify_chat(
            &hub.admin_bot,
            chat,
            "Usage: <code>/search &lt;username or telegram id&gt;</code>",
            None,
        )
        .await;
        return Ok(());
    }

    let profiles = hub.db.search_profiles(query).await?;
    if profiles.is_empty() {
        let text = format!("🔍 Nobody found for \"{}\".", encode_text(query));
        notify_chat(&hub.admin_bot, chat, &text, None).await;
        return Ok(());
    }

    for profile in profiles {
        let articles = hub.db.count_articles_by_author(profile.id).await?;
        hub.admin_bot
            .send_text(
                chat,
                &profile_card(&profile, articles),
                Some(premium_keyboard(profile.telegram_id, profile.is_premium)),
            )
            .await?;
    }
    Ok(())
}

/// `/premium`.
pub async fn premium_overview<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
) -> Result<(), ModerationError> {
    let count = hub.db.count_premium_profiles().await?;
    let profiles = hub.db.list_premium_profiles(PREMIUM_LIST_LIMIT).await?;

    let mut text = format!("👑 <b>Premium users:</b> {count}\n");
    for profile in &profiles {
        let until = match profile.premium_expires_at {
            Some(x) => x.format("%Y-%m-%d").to_string(),
            None => "forever".to_string(),
        };
        let _ = write!(
            text,
            "\n• {} until {until}",
            encode_text(&profile.display_name())
        );
    }
    notify_chat(&hub.admin_bot, chat, &text, None).await;
    Ok(())
}

/// `/pending`: send the oldest pending articles out again, buttons and all.
pub async fn pending<M: Messenger>(hub: &Hub<M>, chat: ChatId) -> Result<(), ModerationError> {
    let articles = hub.db.list_pending_articles(PENDING_LIMIT).await?;
    if articles.is_empty() {
        notify_chat(&hub.admin_bot, chat, "✅ Nothing waits for moderation.", None).await;
        return Ok(());
    }

    let text = format!("⏳ <b>Pending articles:</b> {}", articles.len());
    notify_chat(&hub.admin_bot, chat, &text, None).await;
    for article in articles {
        if let Err(e) = send_moderation_request(hub, chat, article.id).await {
            log::warn!("Failed to resend article {}: {e}", article.id);
        }
    }
    Ok(())
}

/// `/broadcast <text>`: send the text to everyone with a profile, one by
/// one.
pub async fn broadcast<M: Messenger>(
    hub: &Hub<M>,
    chat: ChatId,
    text: &str,
) -> Result<BroadcastTally, ModerationError> {
    let text = text.trim();
    if text.is_empty() {
        notify_chat(
            &hub.admin_bot,
            chat,
            "Usage: <code>/broadcast &lt;text&gt;</code>",
            None,
        )
        .await;
        return Ok(BroadcastTally::default());
    }

    let message = format!("📢 {}", encode_text(text));
    let mut tally = BroadcastTally::default();
    for user in hub.db.all_telegram_ids().await? {
        match notify_author(hub, user, &message).await {
            true => tally.sent += 1,
            false => tally.failed += 1,
        }
    }

    log::info!(
        "Broadcast done: {} sent, {} failed",
        tally.sent,
        tally.failed
    );
    let report = format!(
        "📢 Broadcast done.\n\n✅ Sent: {}\n❌ Failed: {}",
        tally.sent, tally.failed
    );
    notify_chat(&hub.admin_bot, chat, &report, None).await;
    Ok(tally)
}
