// src/db/shift_repo.rs

use chrono::NaiveTime;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::shift::{Shift, ShiftListItem},
};

const SHIFT_COLUMNS: &str =
    "id, company_id, name, start_time, end_time, grace_period_minutes, is_default, created_at, updated_at";

/// Campos graváveis de um turno, já convertidos.
#[derive(Debug, Clone)]
pub struct ShiftFields {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_period_minutes: i32,
    pub is_default: bool,
}

#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<ShiftListItem>, AppError> {
        let shifts = sqlx::query_as::<_, ShiftListItem>(
            r#"
            SELECT
                s.id, s.name, s.start_time, s.end_time, s.grace_period_minutes, s.is_default,
                (SELECT COUNT(*) FROM employee e WHERE e.shift_id = s.id) AS employee_count
            FROM shift s
            WHERE s.company_id = $1
            ORDER BY s.start_time, s.name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shifts)
    }

    pub async fn find<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Shift>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shift WHERE id = $1 AND company_id = $2",
            SHIFT_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(shift)
    }

    /// No máximo um turno padrão por empresa: limpamos o anterior antes de gravar.
    pub async fn clear_default<'e, E>(&self, executor: E, company_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE shift SET is_default = FALSE, updated_at = NOW() WHERE company_id = $1 AND is_default")
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create<'e, E>(&self, executor: E, company_id: Uuid, fields: &ShiftFields) -> Result<Shift, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shift (company_id, name, start_time, end_time, grace_period_minutes, is_default)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        ))
        .bind(company_id)
        .bind(&fields.name)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.grace_period_minutes)
        .bind(fields.is_default)
        .fetch_one(executor)
        .await?;
        Ok(shift)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        fields: &ShiftFields,
    ) -> Result<Option<Shift>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shift SET
                name = $3, start_time = $4, end_time = $5,
                grace_period_minutes = $6, is_default = $7, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(&fields.name)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.grace_period_minutes)
        .bind(fields.is_default)
        .fetch_optional(executor)
        .await?;
        Ok(shift)
    }

    pub async fn unassign_employees<'e, E>(&self, executor: E, company_id: Uuid, shift_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE employee SET shift_id = NULL, updated_at = NOW() WHERE company_id = $1 AND shift_id = $2",
        )
        .bind(company_id)
        .bind(shift_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM shift WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Só toca em funcionários da própria empresa; ids de outras empresas são ignorados.
    pub async fn assign(
        &self,
        company_id: Uuid,
        employee_ids: &[Uuid],
        shift_id: Option<Uuid>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE employee SET shift_id = $3, updated_at = NOW() WHERE company_id = $1 AND id = ANY($2)",
        )
        .bind(company_id)
        .bind(employee_ids)
        .bind(shift_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
