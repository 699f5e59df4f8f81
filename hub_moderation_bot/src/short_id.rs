//! Compact tokens standing in for article IDs in callback payloads.

use crate::{
    database::{Database, ShortIdInsert},
    error::ModerationError,
    types::{ArticleId, ShortId},
};

/// How many fresh tokens to try before giving up on a collision streak.
const MINT_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
enum RegistryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("every minted token collided with another article's")]
    Exhausted,
}

/// Get the token for this article, registering a new one if it has none.
///
/// Asking twice gives the same token. If two callers race, both end up with
/// whichever token got stored first. If the registry is unavailable, this
/// logs and hands out [`ShortId::degraded`], which can't be resolved back.
pub async fn get_or_create_short_id(db: &Database, article: ArticleId) -> ShortId {
    match try_get_or_create(db, article).await {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to register a short ID for article {article}: {e}");
            ShortId::degraded(article)
        }
    }
}

async fn try_get_or_create(db: &Database, article: ArticleId) -> Result<ShortId, RegistryError> {
    if let Some(token) = db.get_short_id(article).await? {
        return Ok(token);
    }

    for _ in 0..MINT_ATTEMPTS {
        let candidate = ShortId::mint();
        match db.insert_short_id(article, &candidate).await? {
            ShortIdInsert::Registered(token) => {
                if token == candidate {
                    log::debug!("Registered short ID {token} for article {article}");
                }
                return Ok(token);
            }
            ShortIdInsert::Taken => {
                log::debug!("Short ID {candidate} is taken, minting another one");
            }
        }
    }

    Err(RegistryError::Exhausted)
}

/// Find the article a token from a button stands for.
///
/// `Ok(None)` means there's no such token; `Err` means the registry couldn't
/// be asked. Neither lets a moderation action go ahead.
pub async fn resolve_short_id(
    db: &Database,
    token: &ShortId,
) -> Result<Option<ArticleId>, sqlx::Error> {
    db.resolve_short_id(token).await
}

/// Like [`resolve_short_id`], but "not found" is an error too.
pub async fn resolve_or_fail(db: &Database, token: &ShortId) -> Result<ArticleId, ModerationError> {
    match resolve_short_id(db, token).await {
        Ok(Some(article)) => Ok(article),
        Ok(None) => {
            log::info!("Got a button for unknown short ID {token}");
            Err(ModerationError::UnknownShortId(token.clone()))
        }
        Err(e) => {
            log::error!("Failed to resolve short ID {token}: {e}");
            Err(e.into())
        }
    }
}
