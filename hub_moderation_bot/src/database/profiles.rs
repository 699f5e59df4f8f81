use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use teloxide::types::UserId;
use uuid::Uuid;

use super::{
    types::{user_id_from_db, user_id_to_db},
    Database, Error, Profile, ProfileUpsert,
};

impl Database {
    /// Create a profile for this Telegram user, or refresh the names and
    /// avatar of the existing one. Premium status and reputation are left
    /// alone on refresh.
    pub async fn upsert_profile(&self, data: &ProfileUpsert) -> Result<Profile, Error> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO profiles(id, telegram_id, username, first_name, last_name,
                avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(telegram_id) DO
            UPDATE SET username=excluded.username, first_name=excluded.first_name,
                last_name=excluded.last_name, avatar_url=excluded.avatar_url,
                updated_at=excluded.updated_at;",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id_to_db(data.telegram_id))
        .bind(data.username.as_deref())
        .bind(data.first_name.as_str())
        .bind(data.last_name.as_deref())
        .bind(data.avatar_url.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_profile_by_telegram_id(data.telegram_id)
            .await?
            .ok_or(Error::RowNotFound)
    }

    pub async fn get_profile_by_telegram_id(&self, id: UserId) -> Result<Option<Profile>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE telegram_id=?;",
            Profile::COLUMNS
        ))
        .bind(user_id_to_db(id))
        .try_map(|row: SqliteRow| Profile::from_row(&row))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, Error> {
        sqlx::query(&format!("SELECT {} FROM profiles WHERE id=?;", Profile::COLUMNS))
            .bind(id.to_string())
            .try_map(|row: SqliteRow| Profile::from_row(&row))
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn count_profiles(&self) -> Result<i64, Error> {
        Ok(sqlx::query("SELECT COUNT(*) FROM profiles;")
            .fetch_one(&self.pool)
            .await?
            .get(0))
    }

    pub async fn count_premium_profiles(&self) -> Result<i64, Error> {
        Ok(sqlx::query("SELECT COUNT(*) FROM profiles WHERE is_premium=1;")
            .fetch_one(&self.pool)
            .await?
            .get(0))
    }

    /// Newest profiles first.
    pub async fn list_profiles(&self, offset: i64, limit: i64) -> Result<Vec<Profile>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?;",
            Profile::COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .try_map(|row: SqliteRow| Profile::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    /// Find profiles by exact Telegram ID if `query` is a number, or by a part
    /// of the username otherwise. A leading `@` is ignored.
    pub async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>, Error> {
        let query = query.trim().trim_start_matches('@');

        if let Ok(telegram_id) = query.parse::<u64>() {
            return Ok(self
                .get_profile_by_telegram_id(UserId(telegram_id))
                .await?
                .into_iter()
                .collect());
        }

        sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE username LIKE '%' || ? || '%' LIMIT 10;",
            Profile::COLUMNS
        ))
        .bind(query)
        .try_map(|row: SqliteRow| Profile::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    /// Premium profiles, soonest to expire first.
    pub async fn list_premium_profiles(&self, limit: i64) -> Result<Vec<Profile>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE is_premium=1
            ORDER BY premium_expires_at IS NULL, premium_expires_at ASC LIMIT ?;",
            Profile::COLUMNS
        ))
        .bind(limit)
        .try_map(|row: SqliteRow| Profile::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    /// Set premium status of a user. `Some` grants it until that moment,
    /// `None` takes it away. Returns `false` if there's no such user.
    pub async fn set_premium(
        &self,
        id: UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE profiles SET is_premium=?, premium_expires_at=?, updated_at=?
            WHERE telegram_id=?;",
        )
        .bind(expires_at.is_some())
        .bind(expires_at)
        .bind(Utc::now())
        .bind(user_id_to_db(id))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Telegram IDs of everyone, for broadcasts.
    pub async fn all_telegram_ids(&self) -> Result<Vec<UserId>, Error> {
        sqlx::query("SELECT telegram_id FROM profiles;")
            .map(|row: SqliteRow| user_id_from_db(row.get(0)))
            .fetch_all(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn upsert(telegram_id: u64, username: Option<&str>) -> ProfileUpsert {
        ProfileUpsert {
            telegram_id: UserId(telegram_id),
            username: username.map(str::to_string),
            first_name: "Test".to_string(),
            last_name: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_id_and_premium() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let first = db.upsert_profile(&upsert(100, Some("old"))).await.unwrap();
        assert!(db
            .set_premium(UserId(100), Some(Utc::now() + chrono::Duration::days(30)))
            .await
            .unwrap());

        let second = db.upsert_profile(&upsert(100, Some("new"))).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.username.as_deref(), Some("new"));
        assert!(second.is_premium);
        assert_eq!(db.count_profiles().await.unwrap(), 1);
        assert_eq!(db.count_premium_profiles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_by_id_or_username() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.upsert_profile(&upsert(100, Some("amogus"))).await.unwrap();
        db.upsert_profile(&upsert(200, Some("sussybaka"))).await.unwrap();

        let found = db.search_profiles("200").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].telegram_id, UserId(200));

        let found = db.search_profiles("@mog").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].telegram_id, UserId(100));

        assert!(db.search_profiles("nobody").await.unwrap().is_empty());
        assert!(!db.set_premium(UserId(300), None).await.unwrap());
    }
}
