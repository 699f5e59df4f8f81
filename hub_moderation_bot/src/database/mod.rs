mod articles;
mod moderation;
mod profiles;
mod support;
mod types;

pub use moderation::ShortIdInsert;
pub use types::*;

use std::str::FromStr;

pub use sqlx::Error;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, Sqlite,
};

type Pool = sqlx::Pool<Sqlite>;

/// Turn a failure to parse a stored value into a database decoding error.
fn decode<T, E>(result: Result<T, E>) -> Result<T, Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.map_err(|e| Error::Decode(Box::new(e)))
}

pub struct Database {
    pool: Pool,
}

impl Database {
    /// Connect to the sqlite database at `url`, creating it and its tables if
    /// needed. `sqlite::memory:` gives a fresh private database.
    pub async fn new(url: &str) -> Result<Database, Error> {
        let in_memory = url.contains(":memory:");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .pragma("cache_size", "-32768")
            .busy_timeout(std::time::Duration::from_secs(600));

        // Every connection to an in-memory database is its own database,
        // so there has to be exactly one and it must never be recycled.
        let pool_options = match in_memory {
            true => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            false => SqlitePoolOptions::new().max_connections(32),
        };

        let pool = pool_options.connect_with(options).await?;

        // Do some init. Create the tables...

        // PROFILES:
        // id (uuid as text)
        // telegram_id (unique, i64 because sqlite doesn't support u64)
        // premium_expires_at (date+time in UTC, NULL if not premium or forever)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY NOT NULL,
                telegram_id INTEGER UNIQUE NOT NULL,
                username TEXT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NULL,
                avatar_url TEXT NULL,
                is_premium INTEGER NOT NULL DEFAULT 0,
                premium_expires_at TEXT NULL,
                reputation INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // ARTICLES:
        // status ("pending", "approved" or "rejected")
        // rejection_reason (set only while rejected)
        // pending_edit (EditPayload serialized in JSON, NULL if no edit is waiting)
        // telegram_message_id (i32 (because telegram bot api is just like that),
        //                      the latest moderation request in the admin chat)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY NOT NULL,
                author_id TEXT NOT NULL REFERENCES profiles(id),
                category_id TEXT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                preview TEXT NOT NULL,
                media_url TEXT NULL,
                media_type TEXT NULL,
                is_anonymous INTEGER NOT NULL DEFAULT 0,
                allow_comments INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'pending',
                rejection_reason TEXT NULL,
                pending_edit TEXT NULL,
                telegram_message_id INTEGER NULL,
                created_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // MODERATION_SHORT_IDS:
        // One token per article, never reassigned.
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS moderation_short_ids (
                article_id TEXT PRIMARY KEY NOT NULL REFERENCES articles(id),
                short_id TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // PENDING_REJECTIONS:
        // An admin pressed "reject" and the next text from them is the reason.
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS pending_rejections (
                id INTEGER PRIMARY KEY NOT NULL,
                admin_telegram_id INTEGER NOT NULL,
                article_id TEXT NOT NULL REFERENCES articles(id),
                short_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // SUPPORT_QUESTIONS:
        // admin_message_id (i32, the message in the admin chat a reply to
        //                   which is the answer)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS support_questions (
                id TEXT PRIMARY KEY NOT NULL,
                user_telegram_id INTEGER NOT NULL,
                user_profile_id TEXT NULL,
                question TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                admin_message_id INTEGER NULL,
                answer TEXT NULL,
                answered_by_telegram_id INTEGER NULL,
                answered_at TEXT NULL,
                created_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // MODERATION_LOGS:
        // Append-only. action ("approved" or "rejected"), target ("article" or "edit")
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS moderation_logs (
                id INTEGER PRIMARY KEY NOT NULL,
                article_id TEXT NOT NULL,
                moderator_telegram_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                target TEXT NOT NULL DEFAULT 'article',
                reason TEXT NULL,
                created_at TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        pool.execute(sqlx::query(
            "CREATE INDEX IF NOT EXISTS articles_status ON articles(status);",
        ))
        .await?;
        pool.execute(sqlx::query(
            "CREATE INDEX IF NOT EXISTS articles_author ON articles(author_id);",
        ))
        .await?;
        pool.execute(sqlx::query(
            "CREATE INDEX IF NOT EXISTS pending_rejections_admin
            ON pending_rejections(admin_telegram_id);",
        ))
        .await?;
        pool.execute(sqlx::query(
            "CREATE INDEX IF NOT EXISTS support_questions_admin_message
            ON support_questions(admin_message_id);",
        ))
        .await?;

        Ok(Database { pool })
    }
}

#[cfg(test)]
impl Database {
    /// Shut the pool down, so every following query fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use teloxide::types::UserId;

    #[tokio::test]
    async fn reopening_keeps_data() {
        let path = std::env::temp_dir().join(format!("hub-{}.sqlite", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());

        let db = Database::new(&url).await.unwrap();
        db.upsert_profile(&ProfileUpsert {
            telegram_id: UserId(7),
            username: None,
            first_name: "Seven".to_string(),
            last_name: None,
            avatar_url: None,
        })
        .await
        .unwrap();
        db.pool.close().await;

        // Tables and indexes already exist the second time around.
        let db = Database::new(&url).await.unwrap();
        assert_eq!(db.count_profiles().await.unwrap(), 1);
        db.pool.close().await;

        let _ = std::fs::remove_file(&path);
    }
}
