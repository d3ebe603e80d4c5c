use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use shopfront_contact::{ContactStore, ContactSubmission};
use shopfront_core::{StoreError, SubmissionId};

use super::{decode_error, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresContactStore {
    pool: PgPool,
}

impl PostgresContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn submission_from_row(row: &PgRow) -> Result<ContactSubmission, StoreError> {
    let decode = |e: sqlx::Error| decode_error("submission_from_row", e);
    Ok(ContactSubmission {
        id: SubmissionId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        subject: row.try_get("subject").map_err(decode)?,
        message: row.try_get("message").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        is_read: row.try_get("is_read").map_err(decode)?,
    })
}

#[async_trait]
impl ContactStore for PostgresContactStore {
    #[instrument(skip(self, submission), fields(submission_id = %submission.id), err)]
    async fn insert(&self, submission: ContactSubmission) -> Result<ContactSubmission, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO contact_submissions (id, name, email, subject, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*submission.id.as_uuid())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(submission.is_read)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_submission", e))?;
        Ok(submission)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        let rows = sqlx::query("SELECT * FROM contact_submissions ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_submissions", e))?;
        rows.iter().map(submission_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn set_read(&self, id: SubmissionId, is_read: bool) -> Result<Option<ContactSubmission>, StoreError> {
        let row = sqlx::query("UPDATE contact_submissions SET is_read = $2 WHERE id = $1 RETURNING *")
            .bind(*id.as_uuid())
            .bind(is_read)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_submission_read", e))?;
        row.as_ref().map(submission_from_row).transpose()
    }
}
