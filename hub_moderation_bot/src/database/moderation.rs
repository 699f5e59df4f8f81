use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use teloxide::types::UserId;

use super::{
    decode,
    types::{user_id_to_db, NewLogEntry},
    Database, Error, PendingRejection,
};
use crate::types::{ArticleId, ShortId};

/// Result of trying to register a short ID for an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortIdInsert {
    /// The article has this token now, either the one we offered or one
    /// somebody else registered first.
    Registered(ShortId),
    /// The offered token already belongs to a different article.
    Taken,
}

impl Database {
    pub async fn get_short_id(&self, article: ArticleId) -> Result<Option<ShortId>, Error> {
        sqlx::query("SELECT short_id FROM moderation_short_ids WHERE article_id=?;")
            .bind(article.to_string())
            .try_map(|row: SqliteRow| {
                let token: &str = row.try_get(0)?;
                ShortId::parse(token).ok_or_else(|| Error::ColumnDecode {
                    index: "short_id".to_string(),
                    source: format!("malformed short ID {token:?}").into(),
                })
            })
            .fetch_optional(&self.pool)
            .await
    }

    /// Try to register `token` for `article`. If the article already has a
    /// token, nothing is written and the existing one is returned.
    pub async fn insert_short_id(
        &self,
        article: ArticleId,
        token: &ShortId,
    ) -> Result<ShortIdInsert, Error> {
        let result = sqlx::query(
            "INSERT INTO moderation_short_ids(article_id, short_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(article_id) DO NOTHING;",
        )
        .bind(article.to_string())
        .bind(token.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            // The token is someone else's.
            Err(Error::Database(e)) if e.is_unique_violation() => return Ok(ShortIdInsert::Taken),
            Err(e) => return Err(e),
        }

        self.get_short_id(article)
            .await?
            .map(ShortIdInsert::Registered)
            .ok_or(Error::RowNotFound)
    }

    /// Find the article a token stands for. An exact match wins; otherwise
    /// the token may be a prefix of exactly one registered token.
    pub async fn resolve_short_id(&self, token: &ShortId) -> Result<Option<ArticleId>, Error> {
        let exact = sqlx::query("SELECT article_id FROM moderation_short_ids WHERE short_id=?;")
            .bind(token.as_str())
            .try_map(|row: SqliteRow| decode(row.try_get::<&str, _>(0)?.parse::<ArticleId>()))
            .fetch_optional(&self.pool)
            .await?;

        if exact.is_some() {
            return Ok(exact);
        }

        // substr instead of LIKE, since LIKE is case-insensitive and treats
        // `_` as a wildcard.
        let mut candidates = sqlx::query(
            "SELECT article_id FROM moderation_short_ids
            WHERE substr(short_id, 1, length(?)) = ? LIMIT 2;",
        )
        .bind(token.as_str())
        .bind(token.as_str())
        .try_map(|row: SqliteRow| decode(row.try_get::<&str, _>(0)?.parse::<ArticleId>()))
        .fetch_all(&self.pool)
        .await?;

        Ok(match candidates.len() {
            1 => candidates.pop(),
            _ => None,
        })
    }

    /// Remember that `admin` pressed "reject" on this article and the next
    /// text from them is the reason.
    pub async fn open_pending_rejection(
        &self,
        admin: UserId,
        article: ArticleId,
        token: &ShortId,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO pending_rejections(admin_telegram_id, article_id, short_id, created_at)
            VALUES (?, ?, ?, ?);",
        )
        .bind(user_id_to_db(admin))
        .bind(article.to_string())
        .bind(token.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recently opened rejection of this admin, if any.
    pub async fn latest_pending_rejection(
        &self,
        admin: UserId,
    ) -> Result<Option<PendingRejection>, Error> {
        sqlx::query(
            "SELECT id, admin_telegram_id, article_id, short_id, created_at
            FROM pending_rejections WHERE admin_telegram_id=?
            ORDER BY created_at DESC, id DESC LIMIT 1;",
        )
        .bind(user_id_to_db(admin))
        .try_map(|row: SqliteRow| PendingRejection::from_row(&row))
        .fetch_optional(&self.pool)
        .await
    }

    /// Close all of this admin's open rejections of this article.
    pub async fn consume_pending_rejection(
        &self,
        admin: UserId,
        article: ArticleId,
    ) -> Result<u64, Error> {
        let result =
            sqlx::query("DELETE FROM pending_rejections WHERE admin_telegram_id=? AND article_id=?;")
                .bind(user_id_to_db(admin))
                .bind(article.to_string())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn append_moderation_log(&self, entry: &NewLogEntry) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO moderation_logs(article_id, moderator_telegram_id, action, target,
                reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?);",
        )
        .bind(entry.article_id.to_string())
        .bind(user_id_to_db(entry.moderator))
        .bind(entry.action.as_str())
        .bind(entry.target.as_str())
        .bind(entry.reason.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
impl Database {
    pub async fn moderation_log(
        &self,
        article: ArticleId,
    ) -> Result<Vec<super::LogEntry>, Error> {
        sqlx::query(
            "SELECT id, article_id, moderator_telegram_id, action, target, reason, created_at
            FROM moderation_logs WHERE article_id=? ORDER BY id ASC;",
        )
        .bind(article.to_string())
        .try_map(|row: SqliteRow| super::LogEntry::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn pending_rejections_of(
        &self,
        admin: UserId,
    ) -> Result<Vec<PendingRejection>, Error> {
        sqlx::query(
            "SELECT id, admin_telegram_id, article_id, short_id, created_at
            FROM pending_rejections WHERE admin_telegram_id=? ORDER BY id ASC;",
        )
        .bind(user_id_to_db(admin))
        .try_map(|row: SqliteRow| PendingRejection::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    /// Everything moderation can change about every article, to compare
    /// before and after.
    pub async fn articles_snapshot(&self) -> Result<Vec<String>, Error> {
        sqlx::query(
            "SELECT id || '|' || status || '|' || coalesce(rejection_reason, '') || '|' ||
                title || '|' || coalesce(pending_edit, '')
            FROM articles ORDER BY id;",
        )
        .map(|row: SqliteRow| row.get::<String, _>(0))
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{
        database::{NewArticle, ProfileUpsert},
        types::{ModerationAction, ModerationTarget},
    };

    async fn article(db: &Database) -> ArticleId {
        let author = db
            .upsert_profile(&ProfileUpsert {
                telegram_id: UserId(555),
                username: None,
                first_name: "Writer".to_string(),
                last_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        db.insert_article(&NewArticle {
            author_id: author.id,
            category_id: None,
            title: "Title".to_string(),
            body: "Body".to_string(),
            preview: "Body".to_string(),
            media_url: None,
            media_type: None,
            is_anonymous: false,
            allow_comments: true,
        })
        .await
        .unwrap()
        .id
    }

    fn token(x: &str) -> ShortId {
        ShortId::parse(x).unwrap()
    }

    #[tokio::test]
    async fn short_id_registration() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let a = article(&db).await;
        let b = article(&db).await;

        assert_eq!(db.get_short_id(a).await.unwrap(), None);
        assert_eq!(
            db.insert_short_id(a, &token("aaaa1111")).await.unwrap(),
            ShortIdInsert::Registered(token("aaaa1111"))
        );
        // Second registration for the same article keeps the first token.
        assert_eq!(
            db.insert_short_id(a, &token("bbbb2222")).await.unwrap(),
            ShortIdInsert::Registered(token("aaaa1111"))
        );
        // Same token for a different article.
        assert_eq!(
            db.insert_short_id(b, &token("aaaa1111")).await.unwrap(),
            ShortIdInsert::Taken
        );
        assert_eq!(db.get_short_id(b).await.unwrap(), None);
    }

    #[tokio::test]
    async fn short_id_resolution() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let a = article(&db).await;
        let b = article(&db).await;
        db.insert_short_id(a, &token("abcd1234")).await.unwrap();
        db.insert_short_id(b, &token("abce5678")).await.unwrap();

        assert_eq!(db.resolve_short_id(&token("abcd1234")).await.unwrap(), Some(a));
        assert_eq!(db.resolve_short_id(&token("abcd")).await.unwrap(), Some(a));
        assert_eq!(db.resolve_short_id(&token("abc")).await.unwrap(), None);
        assert_eq!(db.resolve_short_id(&token("ABCD1234")).await.unwrap(), None);
        assert_eq!(db.resolve_short_id(&token("ffffffff")).await.unwrap(), None);
        // Searching the registry only, not article IDs.
        let raw = a.0.simple().to_string();
        assert_eq!(db.resolve_short_id(&token(&raw[..8])).await.unwrap(), None);
    }

    #[tokio::test]
    async fn latest_rejection_wins() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let admin = UserId(1);
        let a = article(&db).await;
        let b = article(&db).await;

        assert!(db.latest_pending_rejection(admin).await.unwrap().is_none());

        db.open_pending_rejection(admin, a, &token("aaaa1111")).await.unwrap();
        db.open_pending_rejection(admin, b, &token("bbbb2222")).await.unwrap();
        db.open_pending_rejection(UserId(2), a, &token("aaaa1111"))
            .await
            .unwrap();

        let latest = db.latest_pending_rejection(admin).await.unwrap().unwrap();
        assert_eq!(latest.article_id, b);
        assert_eq!(latest.short_id, "bbbb2222");

        assert_eq!(db.consume_pending_rejection(admin, b).await.unwrap(), 1);
        let left = db.pending_rejections_of(admin).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].article_id, a);
        assert_eq!(db.pending_rejections_of(UserId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn log_appends() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let a = article(&db).await;
        for action in [ModerationAction::Approved, ModerationAction::Rejected] {
            db.append_moderation_log(&NewLogEntry {
                article_id: a,
                moderator: UserId(1),
                action,
                target: ModerationTarget::Edit,
                reason: None,
            })
            .await
            .unwrap();
        }
        let log = db.moderation_log(a).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, ModerationAction::Approved);
        assert_eq!(log[1].target, ModerationTarget::Edit);
        assert_eq!(log[1].moderator, UserId(1));
    }
}
