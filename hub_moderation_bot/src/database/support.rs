use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use teloxide::types::{MessageId, UserId};
use uuid::Uuid;

use super::{types::user_id_to_db, Database, Error, SupportQuestion};
use crate::types::QuestionStatus;

impl Database {
    pub async fn insert_support_question(
        &self,
        user: UserId,
        user_profile_id: Option<Uuid>,
        question: &str,
    ) -> Result<SupportQuestion, Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO support_questions(id, user_telegram_id, user_profile_id, question,
                status, created_at)
            VALUES (?, ?, ?, ?, ?, ?);",
        )
        .bind(id.to_string())
        .bind(user_id_to_db(user))
        .bind(user_profile_id.map(|x| x.to_string()))
        .bind(question)
        .bind(QuestionStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "SELECT {} FROM support_questions WHERE id=?;",
            SupportQuestion::COLUMNS
        ))
        .bind(id.to_string())
        .try_map(|row: SqliteRow| SupportQuestion::from_row(&row))
        .fetch_one(&self.pool)
        .await
    }

    /// Unanswered questions, newest first.
    pub async fn list_pending_questions(&self, limit: i64) -> Result<Vec<SupportQuestion>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM support_questions WHERE status=?
            ORDER BY created_at DESC LIMIT ?;",
            SupportQuestion::COLUMNS
        ))
        .bind(QuestionStatus::Pending.as_str())
        .bind(limit)
        .try_map(|row: SqliteRow| SupportQuestion::from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    /// Find an unanswered question by the start of its ID, as shown on the
    /// question buttons. Anything ambiguous or answered already is not found.
    pub async fn find_pending_question_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<SupportQuestion>, Error> {
        if prefix.is_empty() || !prefix.bytes().all(|x| x.is_ascii_hexdigit() || x == b'-') {
            return Ok(None);
        }

        let mut found = sqlx::query(&format!(
            "SELECT {} FROM support_questions WHERE status=? AND id LIKE ? || '%' LIMIT 2;",
            SupportQuestion::COLUMNS
        ))
        .bind(QuestionStatus::Pending.as_str())
        .bind(prefix.to_ascii_lowercase())
        .try_map(|row: SqliteRow| SupportQuestion::from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        Ok(match found.len() {
            1 => found.pop(),
            _ => None,
        })
    }

    /// Remember the admin chat message showing this question. A reply to it
    /// is the answer. Overwrites the previous one, if any.
    pub async fn set_question_admin_message(
        &self,
        id: Uuid,
        message: MessageId,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE support_questions SET admin_message_id=? WHERE id=?;")
            .bind(message.0)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_pending_question_by_admin_message(
        &self,
        message: MessageId,
    ) -> Result<Option<SupportQuestion>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM support_questions WHERE admin_message_id=? AND status=?
            ORDER BY created_at DESC LIMIT 1;",
            SupportQuestion::COLUMNS
        ))
        .bind(message.0)
        .bind(QuestionStatus::Pending.as_str())
        .try_map(|row: SqliteRow| SupportQuestion::from_row(&row))
        .fetch_optional(&self.pool)
        .await
    }

    /// Record the answer. Returns `false` if the question was answered
    /// already.
    pub async fn answer_question(
        &self,
        id: Uuid,
        answer: &str,
        answered_by: UserId,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE support_questions
            SET status=?, answer=?, answered_by_telegram_id=?, answered_at=?
            WHERE id=? AND status=?;",
        )
        .bind(QuestionStatus::Answered.as_str())
        .bind(answer)
        .bind(user_id_to_db(answered_by))
        .bind(Utc::now())
        .bind(id.to_string())
        .bind(QuestionStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
