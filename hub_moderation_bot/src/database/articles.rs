use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use teloxide::types::MessageId;
use uuid::Uuid;

use super::{decode, Article, ArticleCounts, Database, Error, NewArticle};
use crate::types::{derive_preview, ArticleId, ArticleStatus, EditPayload};

impl Database {
    /// Store a freshly submitted article. It starts out pending.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<Article, Error> {
        let id = ArticleId::new_random();
        sqlx::query(
            "INSERT INTO articles(id, author_id, category_id, title, body, preview,
                media_url, media_type, is_anonymous, allow_comments, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);",
        )
        .bind(id.to_string())
        .bind(article.author_id.to_string())
        .bind(article.category_id.as_deref())
        .bind(article.title.as_str())
        .bind(article.body.as_str())
        .bind(article.preview.as_str())
        .bind(article.media_url.as_deref())
        .bind(article.media_type.map(|x| x.as_str()))
        .bind(article.is_anonymous)
        .bind(article.allow_comments)
        .bind(ArticleStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_article(id).await?.ok_or(Error::RowNotFound)
    }

    pub async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, Error> {
        sqlx::query(&format!("SELECT {} FROM articles WHERE id=?;", Article::COLUMNS))
            .bind(id.to_string())
            .try_map(|row: SqliteRow| Article::from_row(&row))
            .fetch_optional(&self.pool)
            .await
    }

    /// Mark an article approved and forget any rejection reason it had.
    /// Returns `false` if there's no such article.
    pub async fn set_article_approved(&self, id: ArticleId) -> Result<bool, Error> {
        let result =
            sqlx::query("UPDATE articles SET status=?, rejection_reason=NULL WHERE id=?;")
                .bind(ArticleStatus::Approved.as_str())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark an article rejected for `reason`.
    /// Returns `false` if there's no such article.
    pub async fn set_article_rejected(&self, id: ArticleId, reason: &str) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE articles SET status=?, rejection_reason=? WHERE id=?;")
            .bind(ArticleStatus::Rejected.as_str())
            .bind(reason)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Park an edit next to the article until a moderator looks at it.
    /// Replaces an edit that was already waiting.
    pub async fn set_pending_edit(&self, id: ArticleId, edit: &EditPayload) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE articles SET pending_edit=? WHERE id=?;")
            .bind(decode(serde_json::to_string(edit))?)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy `edit` over the live fields and clear it, but only if it's still
    /// the edit waiting on the article. Returns `false` if it wasn't, which
    /// is the case when someone already applied or replaced it.
    pub async fn apply_pending_edit(
        &self,
        id: ArticleId,
        edit: &EditPayload,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE articles SET title=?, body=?, preview=?, is_anonymous=?, pending_edit=NULL
            WHERE id=? AND pending_edit=?;",
        )
        .bind(edit.title.as_str())
        .bind(edit.body.as_str())
        .bind(derive_preview(None, &edit.body))
        .bind(edit.is_anonymous)
        .bind(id.to_string())
        .bind(decode(serde_json::to_string(edit))?)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Throw away the waiting edit. Returns `false` if there was none.
    pub async fn discard_pending_edit(&self, id: ArticleId) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE articles SET pending_edit=NULL WHERE id=? AND pending_edit IS NOT NULL;",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remember which admin chat message is the latest moderation request for
    /// this article.
    pub async fn set_moderation_message(
        &self,
        id: ArticleId,
        message: MessageId,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE articles SET telegram_message_id=? WHERE id=?;")
            .bind(message.0)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Pending articles, oldest first.
    pub async fn list_pending_articles(&self, limit: i64) -> Result<Vec<Article>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM articles WHERE status=? ORDER BY created_at ASC LIMIT ?;",
            Article::COLUMNS
        ))
        .bind(ArticleStatus::Pending.as_str())
        .bind(limit)
        .try_map(|row: SqliteRow| Article::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn article_status_counts(&self) -> Result<ArticleCounts, Error> {
        let rows = sqlx::query("SELECT status, COUNT(*) FROM articles GROUP BY status;")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = ArticleCounts::default();
        for row in rows {
            let count: i64 = row.try_get(1)?;
            match decode(row.try_get::<&str, _>(0)?.parse())? {
                ArticleStatus::Pending => counts.pending = count,
                ArticleStatus::Approved => counts.approved = count,
                ArticleStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }

    pub async fn count_articles_by_author(&self, author: Uuid) -> Result<i64, Error> {
        Ok(sqlx::query("SELECT COUNT(*) FROM articles WHERE author_id=?;")
            .bind(author.to_string())
            .fetch_one(&self.pool)
            .await?
            .get(0))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use teloxide::types::UserId;

    use super::*;
    use crate::database::ProfileUpsert;

    async fn author(db: &Database) -> Uuid {
        db.upsert_profile(&ProfileUpsert {
            telegram_id: UserId(555),
            username: Some("writer".to_string()),
            first_name: "Writer".to_string(),
            last_name: None,
            avatar_url: None,
        })
        .await
        .unwrap()
        .id
    }

    fn new_article(author_id: Uuid, title: &str) -> NewArticle {
        NewArticle {
            author_id,
            category_id: None,
            title: title.to_string(),
            body: "Body text".to_string(),
            preview: derive_preview(None, "Body text"),
            media_url: None,
            media_type: None,
            is_anonymous: false,
            allow_comments: true,
        }
    }

    #[tokio::test]
    async fn status_changes() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let author_id = author(&db).await;
        let article = db.insert_article(&new_article(author_id, "Test")).await.unwrap();
        assert_eq!(article.status, ArticleStatus::Pending);
        assert_eq!(article.rejection_reason, None);

        assert!(db.set_article_rejected(article.id, "too short").await.unwrap());
        let rejected = db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, ArticleStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("too short"));

        assert!(db.set_article_approved(article.id).await.unwrap());
        let approved = db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(approved.status, ArticleStatus::Approved);
        assert_eq!(approved.rejection_reason, None);

        assert!(!db.set_article_approved(ArticleId::new_random()).await.unwrap());

        let counts = db.article_status_counts().await.unwrap();
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.total(), 1);
        assert_eq!(db.count_articles_by_author(author_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_edits() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let author_id = author(&db).await;
        let article = db.insert_article(&new_article(author_id, "Old")).await.unwrap();

        let edit = EditPayload {
            title: "New".to_string(),
            body: "New body".to_string(),
            is_anonymous: true,
        };
        let stale = EditPayload {
            title: "Stale".to_string(),
            ..edit.clone()
        };

        assert!(db.set_pending_edit(article.id, &edit).await.unwrap());
        let waiting = db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(waiting.title, "Old");
        assert_eq!(waiting.pending_edit.as_ref(), Some(&edit));

        assert!(!db.apply_pending_edit(article.id, &stale).await.unwrap());
        assert!(db.apply_pending_edit(article.id, &edit).await.unwrap());
        assert!(!db.apply_pending_edit(article.id, &edit).await.unwrap());

        let applied = db.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(applied.title, "New");
        assert_eq!(applied.preview, "New body");
        assert!(applied.is_anonymous);
        assert_eq!(applied.pending_edit, None);

        assert!(!db.discard_pending_edit(article.id).await.unwrap());
    }

    #[tokio::test]
    async fn pending_list_and_message() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let author_id = author(&db).await;
        let first = db.insert_article(&new_article(author_id, "First")).await.unwrap();
        let second = db.insert_article(&new_article(author_id, "Second")).await.unwrap();
        db.set_article_approved(second.id).await.unwrap();

        db.set_moderation_message(first.id, MessageId(77)).await.unwrap();

        let pending = db.list_pending_articles(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[0].telegram_message_id, Some(MessageId(77)));
    }
}
