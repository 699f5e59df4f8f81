//! The article lifecycle: pending, then approved or rejected, plus edits
//! waiting next to a live article.
//!
//! Every decision is planned as an ordered list of [`Effect`]s and then
//! executed. Store writes come first and stop the list when they fail.
//! Messages come after them and only get logged when they fail, since the
//! decision is already made by then.

use hub_bot_commons::messenger::Messenger;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::{
    callback::Ack,
    database::{Article, Database, NewLogEntry, Profile},
    error::ModerationError,
    hub::Hub,
    notify::{notify_author, notify_chat, strip_keyboard},
    short_id::resolve_or_fail,
    types::{ArticleId, EditPayload, ModerationAction, ModerationTarget, ShortId},
};

pub mod render;

mod requests;
pub use requests::*;

/// Where a moderation button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub chat: ChatId,
    /// The message carrying the button, if Telegram still told us.
    pub message: Option<MessageId>,
}

/// A change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persist {
    Approve(ArticleId),
    Reject {
        article: ArticleId,
        reason: String,
    },
    ApplyEdit {
        article: ArticleId,
        edit: EditPayload,
    },
    DiscardEdit(ArticleId),
    OpenPendingRejection {
        admin: UserId,
        article: ArticleId,
        token: ShortId,
    },
    ConsumePendingRejection {
        admin: UserId,
        article: ArticleId,
    },
    Log(NewLogEntry),
}

/// One step of a moderation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist(Persist),
    NotifyAuthor { user: UserId, text: String },
    StripKeyboard { chat: ChatId, message: MessageId },
    ConfirmToAdmin { chat: ChatId, text: String },
}

fn log_entry(
    article: ArticleId,
    moderator: UserId,
    action: ModerationAction,
    target: ModerationTarget,
    reason: Option<String>,
) -> Effect {
    Effect::Persist(Persist::Log(NewLogEntry {
        article_id: article,
        moderator,
        action,
        target,
        reason,
    }))
}

/// Push author notification, if there's an author to notify.
fn notify(effects: &mut Vec<Effect>, author: Option<&Profile>, text: String) {
    if let Some(author) = author {
        effects.push(Effect::NotifyAuthor {
            user: author.telegram_id,
            text,
        });
    }
}

fn strip(effects: &mut Vec<Effect>, origin: Origin) {
    if let Some(message) = origin.message {
        effects.push(Effect::StripKeyboard {
            chat: origin.chat,
            message,
        });
    }
}

#[must_use]
pub fn plan_approve(
    article: &Article,
    author: Option<&Profile>,
    moderator: UserId,
    origin: Origin,
) -> Vec<Effect> {
    let mut effects = vec![
        Effect::Persist(Persist::Approve(article.id)),
        // A reason typed after this must not reject the approved article.
        Effect::Persist(Persist::ConsumePendingRejection {
            admin: moderator,
            article: article.id,
        }),
        log_entry(
            article.id,
            moderator,
            ModerationAction::Approved,
            ModerationTarget::Article,
            None,
        ),
    ];
    notify(&mut effects, author, render::approved_for_author(&article.title));
    strip(&mut effects, origin);
    effects.push(Effect::ConfirmToAdmin {
        chat: origin.chat,
        text: render::approved_for_admin(&article.title),
    });
    effects
}

/// First half of a rejection: the status stays as it is, only a window for
/// the reason is opened.
#[must_use]
pub fn plan_open_rejection(
    article: &Article,
    token: &ShortId,
    admin: UserId,
    origin: Origin,
) -> Vec<Effect> {
    let mut effects = vec![Effect::Persist(Persist::OpenPendingRejection {
        admin,
        article: article.id,
        token: token.clone(),
    })];
    strip(&mut effects, origin);
    effects.push(Effect::ConfirmToAdmin {
        chat: origin.chat,
        text: render::reason_prompt(&article.title),
    });
    effects
}

/// Second half of a rejection, once the reason arrived.
#[must_use]
pub fn plan_complete_rejection(
    article: &Article,
    author: Option<&Profile>,
    admin: UserId,
    chat: ChatId,
    reason: &str,
) -> Vec<Effect> {
    let mut effects = vec![
        Effect::Persist(Persist::Reject {
            article: article.id,
            reason: reason.to_string(),
        }),
        Effect::Persist(Persist::ConsumePendingRejection {
            admin,
            article: article.id,
        }),
        log_entry(
            article.id,
            admin,
            ModerationAction::Rejected,
            ModerationTarget::Article,
            Some(reason.to_string()),
        ),
    ];
    notify(
        &mut effects,
        author,
        render::rejected_for_author(&article.title, reason),
    );
    effects.push(Effect::ConfirmToAdmin {
        chat,
        text: render::rejected_for_admin(&article.title, reason),
    });
    effects
}

#[must_use]
pub fn plan_approve_edit(
    article: &Article,
    edit: &EditPayload,
    author: Option<&Profile>,
    moderator: UserId,
    origin: Origin,
) -> Vec<Effect> {
    let mut effects = vec![
        Effect::Persist(Persist::ApplyEdit {
            article: article.id,
            edit: edit.clone(),
        }),
        log_entry(
            article.id,
            moderator,
            ModerationAction::Approved,
            ModerationTarget::Edit,
            None,
        ),
    ];
    notify(&mut effects, author, render::edit_approved_for_author(&edit.title));
    strip(&mut effects, origin);
    effects.push(Effect::ConfirmToAdmin {
        chat: origin.chat,
        text: render::edit_approved_for_admin(&edit.title),
    });
    effects
}

#[must_use]
pub fn plan_reject_edit(
    article: &Article,
    author: Option<&Profile>,
    moderator: UserId,
    origin: Origin,
) -> Vec<Effect> {
    let mut effects = vec![
        Effect::Persist(Persist::DiscardEdit(article.id)),
        log_entry(
            article.id,
            moderator,
            ModerationAction::Rejected,
            ModerationTarget::Edit,
            None,
        ),
    ];
    notify(&mut effects, author, render::edit_rejected_for_author(&article.title));
    strip(&mut effects, origin);
    effects.push(Effect::ConfirmToAdmin {
        chat: origin.chat,
        text: render::edit_rejected_for_admin(&article.title),
    });
    effects
}

async fn persist(db: &Database, change: Persist) -> Result<(), ModerationError> {
    match change {
        Persist::Approve(article) => {
            if !db.set_article_approved(article).await? {
                return Err(ModerationError::ArticleNotFound(article));
            }
        }
        Persist::Reject { article, reason } => {
            if !db.set_article_rejected(article, &reason).await? {
                return Err(ModerationError::ArticleNotFound(article));
            }
        }
        Persist::ApplyEdit { article, edit } => {
            // Someone got to it first, or the author sent a newer edit.
            if !db.apply_pending_edit(article, &edit).await? {
                return Err(ModerationError::NoPendingEdit(article));
            }
        }
        Persist::DiscardEdit(article) => {
            if !db.discard_pending_edit(article).await? {
                return Err(ModerationError::NoPendingEdit(article));
            }
        }
        Persist::OpenPendingRejection {
            admin,
            article,
            token,
        } => db.open_pending_rejection(admin, article, &token).await?,
        Persist::ConsumePendingRejection { admin, article } => {
            db.consume_pending_rejection(admin, article).await?;
        }
        Persist::Log(entry) => db.append_moderation_log(&entry).await?,
    }
    Ok(())
}

/// Run the effects in order. The first failed store write stops the rest;
/// failed messages don't.
pub async fn execute<M: Messenger>(
    hub: &Hub<M>,
    effects: Vec<Effect>,
) -> Result<(), ModerationError> {
    for effect in effects {
        match effect {
            Effect::Persist(change) => persist(&hub.db, change).await?,
            Effect::NotifyAuthor { user, text } => {
                if !notify_author(hub, user, &text).await {
                    log::info!("Author {user} was not notified, the decision stands anyway");
                }
            }
            Effect::StripKeyboard { chat, message } => strip_keyboard(hub, chat, message).await,
            Effect::ConfirmToAdmin { chat, text } => {
                notify_chat(&hub.admin_bot, chat, &text, None).await;
            }
        }
    }
    Ok(())
}

async fn load_article<M: Messenger>(
    hub: &Hub<M>,
    token: &ShortId,
) -> Result<(Article, Option<Profile>), ModerationError> {
    let id = resolve_or_fail(&hub.db, token).await?;
    let article = hub
        .db
        .get_article(id)
        .await?
        .ok_or(ModerationError::ArticleNotFound(id))?;
    let author = hub.db.get_profile(article.author_id).await?;
    Ok((article, author))
}

/// `approve:<token>`. Works on an article in any state, so pressing it
/// twice is harmless.
pub async fn approve<M: Messenger>(
    hub: &Hub<M>,
    moderator: UserId,
    origin: Origin,
    token: &ShortId,
) -> Result<Ack, ModerationError> {
    let (article, author) = load_article(hub, token).await?;
    execute(hub, plan_approve(&article, author.as_ref(), moderator, origin)).await?;
    log::info!("Article {} approved by {moderator}", article.id);
    Ok(Ack::toast("✅ Article approved"))
}

/// `reject:<token>`. Only asks for the reason; see [`complete_rejection`].
pub async fn open_rejection<M: Messenger>(
    hub: &Hub<M>,
    admin: UserId,
    origin: Origin,
    token: &ShortId,
) -> Result<Ack, ModerationError> {
    let (article, _) = load_article(hub, token).await?;
    execute(hub, plan_open_rejection(&article, token, admin, origin)).await?;
    Ok(Ack::toast("📝 Write the rejection reason"))
}

/// Treat `reason` as the reason for the rejection this admin opened last.
/// Returns `false` if they have none open, leaving the text to whoever
/// wants it next.
pub async fn complete_rejection<M: Messenger>(
    hub: &Hub<M>,
    admin: UserId,
    chat: ChatId,
    reason: &str,
) -> Result<bool, ModerationError> {
    let Some(pending) = hub.db.latest_pending_rejection(admin).await? else {
        return Ok(false);
    };

    let Some(article) = hub.db.get_article(pending.article_id).await? else {
        // Nothing left to reject. Close the window so it doesn't eat every
        // following message.
        hub.db
            .consume_pending_rejection(admin, pending.article_id)
            .await?;
        notify_chat(
            &hub.admin_bot,
            chat,
            "❌ The article being rejected no longer exists.",
            None,
        )
        .await;
        return Ok(true);
    };
    let author = hub.db.get_profile(article.author_id).await?;

    execute(
        hub,
        plan_complete_rejection(&article, author.as_ref(), admin, chat, reason),
    )
    .await?;
    log::info!("Article {} rejected by {admin}", article.id);
    Ok(true)
}

/// `edit_approve:<token>`.
pub async fn approve_edit<M: Messenger>(
    hub: &Hub<M>,
    moderator: UserId,
    origin: Origin,
    token: &ShortId,
) -> Result<Ack, ModerationError> {
    let (article, author) = load_article(hub, token).await?;
    let Some(edit) = &article.pending_edit else {
        return Err(ModerationError::NoPendingEdit(article.id));
    };
    execute(
        hub,
        plan_approve_edit(&article, edit, author.as_ref(), moderator, origin),
    )
    .await?;
    log::info!("Edit of article {} approved by {moderator}", article.id);
    Ok(Ack::toast("✅ Edit approved"))
}

/// `edit_reject:<token>`.
pub async fn reject_edit<M: Messenger>(
    hub: &Hub<M>,
    moderator: UserId,
    origin: Origin,
    token: &ShortId,
) -> Result<Ack, ModerationError> {
    let (article, author) = load_article(hub, token).await?;
    if article.pending_edit.is_none() {
        return Err(ModerationError::NoPendingEdit(article.id));
    }
    execute(
        hub,
        plan_reject_edit(&article, author.as_ref(), moderator, origin),
    )
    .await?;
    log::info!("Edit of article {} rejected by {moderator}", article.id);
    Ok(Ack::toast("❌ Edit rejected"))
}
