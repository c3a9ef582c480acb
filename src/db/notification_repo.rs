// src/db/notification_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{NewNotification, Notification},
};

const NOTIFICATION_COLUMNS: &str =
    "id, company_id, user_id, type, title, message, data, is_read, read_at, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        notification: &NewNotification,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO notification (company_id, user_id, type, title, message, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(company_id)
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_for_user(&self, company_id: Uuid, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, AppError> {
        let items = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {} FROM notification
            WHERE company_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(company_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn unread_count(&self, company_id: Uuid, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE company_id = $1 AND user_id = $2 AND NOT is_read",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, company_id: Uuid, user_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notification SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND company_id = $2 AND user_id = $3
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_all_read(&self, company_id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notification SET is_read = TRUE, read_at = NOW()
            WHERE company_id = $1 AND user_id = $2 AND NOT is_read
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
