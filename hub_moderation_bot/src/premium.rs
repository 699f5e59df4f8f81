//! Premium status of users, managed by the admin from user cards.

use chrono::{DateTime, Duration, Utc};
use html_escape::encode_text;
use hub_bot_commons::messenger::Messenger;
use teloxide::types::UserId;

use crate::{
    callback::Ack,
    database::Profile,
    error::ModerationError,
    hub::Hub,
    moderation::Origin,
    notify::{notify_author, notify_chat, strip_keyboard},
};

/// How long one grant or extension lasts.
pub const PREMIUM_PERIOD_DAYS: i64 = 30;

fn period() -> Duration {
    Duration::days(PREMIUM_PERIOD_DAYS)
}

/// New expiry for an extension: a period on top of whatever is left, or
/// from now if nothing is.
#[must_use]
pub fn extended_expiry(current: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    current.map_or(now, |x| x.max(now)) + period()
}

fn format_expiry(expires_at: Option<DateTime<Utc>>) -> String {
    match expires_at {
        Some(x) => x.format("%Y-%m-%d").to_string(),
        None => "never".to_string(),
    }
}

/// A user card as shown by `/search`.
#[must_use]
pub fn profile_card(profile: &Profile, articles: i64) -> String {
    let premium = match profile.is_premium {
        true => format!(
            "👑 Premium until {}",
            format_expiry(profile.premium_expires_at)
        ),
        false => "No premium".to_string(),
    };
    format!(
        "👤 <b>{}</b>\n🆔 <code>{}</code>\n{premium}\n📝 Articles: {articles}\n⭐ Reputation: {}\n📅 Joined {}",
        encode_text(&profile.display_name()),
        profile.telegram_id,
        profile.reputation,
        profile.created_at.format("%Y-%m-%d"),
    )
}

async fn load_profile<M: Messenger>(hub: &Hub<M>, user: UserId) -> Result<Profile, ModerationError> {
    hub.db
        .get_profile_by_telegram_id(user)
        .await?
        .ok_or(ModerationError::UserNotFound(user))
}

/// Store the new expiry, then tell everyone. `None` revokes.
async fn set_and_announce<M: Messenger>(
    hub: &Hub<M>,
    profile: &Profile,
    origin: Origin,
    expires_at: Option<DateTime<Utc>>,
    for_user: &str,
    for_admin: &str,
) -> Result<(), ModerationError> {
    let user = profile.telegram_id;
    if !hub.db.set_premium(user, expires_at).await? {
        return Err(ModerationError::UserNotFound(user));
    }

    notify_author(hub, user, for_user).await;
    if let Some(message) = origin.message {
        strip_keyboard(hub, origin.chat, message).await;
    }
    notify_chat(&hub.admin_bot, origin.chat, for_admin, None).await;
    Ok(())
}

/// `premium_grant:<telegram id>`.
pub async fn grant<M: Messenger>(
    hub: &Hub<M>,
    origin: Origin,
    user: UserId,
) -> Result<Ack, ModerationError> {
    let profile = load_profile(hub, user).await?;
    let expires_at = Utc::now() + period();
    let until = format_expiry(Some(expires_at));

    set_and_announce(
        hub,
        &profile,
        origin,
        Some(expires_at),
        &format!("👑 <b>You got Premium!</b>\n\nIt lasts until {until}. Enjoy!"),
        &format!(
            "👑 Premium granted to {} until {until}.",
            encode_text(&profile.display_name())
        ),
    )
    .await?;
    log::info!("Premium granted to {user} until {expires_at}");
    Ok(Ack::toast("👑 Premium granted"))
}

/// `premium_revoke:<telegram id>`.
pub async fn revoke<M: Messenger>(
    hub: &Hub<M>,
    origin: Origin,
    user: UserId,
) -> Result<Ack, ModerationError> {
    let profile = load_profile(hub, user).await?;

    set_and_announce(
        hub,
        &profile,
        origin,
        None,
        "Your Premium has ended.",
        &format!(
            "❌ Premium revoked from {}.",
            encode_text(&profile.display_name())
        ),
    )
    .await?;
    log::info!("Premium revoked from {user}");
    Ok(Ack::toast("❌ Premium revoked"))
}

/// `premium_extend:<telegram id>`.
pub async fn extend<M: Messenger>(
    hub: &Hub<M>,
    origin: Origin,
    user: UserId,
) -> Result<Ack, ModerationError> {
    let profile = load_profile(hub, user).await?;
    let current = profile.premium_expires_at.filter(|_| profile.is_premium);
    let expires_at = extended_expiry(current, Utc::now());
    let until = format_expiry(Some(expires_at));

    set_and_announce(
        hub,
        &profile,
        origin,
        Some(expires_at),
        &format!("👑 <b>Your Premium was extended!</b>\n\nIt now lasts until {until}."),
        &format!(
            "📅 Premium of {} extended until {until}.",
            encode_text(&profile.display_name())
        ),
    )
    .await?;
    log::info!("Premium of {user} extended until {expires_at}");
    Ok(Ack::toast("📅 Premium extended"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::{ChatId, MessageId};

    use super::*;
    use crate::testing::{insert_profile, test_hub, Sent, ADMIN_CHAT};

    const ORIGIN: Origin = Origin {
        chat: ADMIN_CHAT,
        message: Some(MessageId(77)),
    };

    #[test]
    fn extension_starts_from_the_later_moment() {
        let now = Utc::now();
        assert_eq!(extended_expiry(None, now), now + period());

        let expired = now - Duration::days(3);
        assert_eq!(extended_expiry(Some(expired), now), now + period());

        let later = now + Duration::days(10);
        assert_eq!(
            extended_expiry(Some(later), now),
            now + Duration::days(10 + PREMIUM_PERIOD_DAYS)
        );
    }

    #[tokio::test]
    async fn grant_extend_revoke() {
        let hub = test_hub().await;
        insert_profile(&hub.db, 42).await;
        let user = UserId(42);

        grant(&hub, ORIGIN, user).await.unwrap();
        let granted = hub.db.get_profile_by_telegram_id(user).await.unwrap().unwrap();
        assert!(granted.is_premium);
        let first_expiry = granted.premium_expires_at.unwrap();
        assert!(first_expiry > Utc::now() + Duration::days(PREMIUM_PERIOD_DAYS - 1));

        extend(&hub, ORIGIN, user).await.unwrap();
        let extended = hub.db.get_profile_by_telegram_id(user).await.unwrap().unwrap();
        assert_eq!(
            extended.premium_expires_at.unwrap(),
            first_expiry + period()
        );

        revoke(&hub, ORIGIN, user).await.unwrap();
        let revoked = hub.db.get_profile_by_telegram_id(user).await.unwrap().unwrap();
        assert!(!revoked.is_premium);
        assert_eq!(revoked.premium_expires_at, None);

        assert_eq!(hub.user_bot.texts_to(ChatId(42)).len(), 3);
        let strips = hub
            .admin_bot
            .sent()
            .into_iter()
            .filter(|x| matches!(x, Sent::ClearKeyboard { .. }))
            .count();
        assert_eq!(strips, 3);
    }

    #[tokio::test]
    async fn unknown_user() {
        let hub = test_hub().await;
        for result in [
            grant(&hub, ORIGIN, UserId(9)).await,
            revoke(&hub, ORIGIN, UserId(9)).await,
            extend(&hub, ORIGIN, UserId(9)).await,
        ] {
            let error = result.unwrap_err();
            assert!(matches!(error, ModerationError::UserNotFound(UserId(9))));
            assert_eq!(error.toast(), "❌ User not found.");
        }
        assert!(hub.user_bot.sent().is_empty());
        assert!(hub.admin_bot.sent().is_empty());
    }
}
