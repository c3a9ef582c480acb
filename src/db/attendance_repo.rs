// src/db/attendance_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::day_bounds, error::AppError, pagination::PageParams},
    models::attendance::{
        AttendanceFilters, AttendanceLog, AttendanceLogItem, NewAttendanceLog, RecentActivityItem, TodayStats,
    },
};

const LOG_COLUMNS: &str = r#"
    id, company_id, employee_id, camera_id, location_id, type, source, confidence,
    is_late, late_minutes, is_early_departure, early_departure_minutes, overtime_minutes,
    captured_at, created_at
"#;

const LIST_WHERE: &str = r#"
    WHERE a.company_id = $1
      AND ($2::text IS NULL
           OR e.first_name ILIKE '%' || $2 || '%'
           OR e.last_name ILIKE '%' || $2 || '%'
           OR e.employee_code ILIKE '%' || $2 || '%')
      AND ($3::uuid IS NULL OR a.location_id = $3)
      AND ($4::uuid IS NULL OR e.department_id = $4)
      AND ($5::timestamptz IS NULL OR a.captured_at >= $5)
      AND ($6::timestamptz IS NULL OR a.captured_at < $6)
      AND ($7::text IS NULL OR a.type = $7)
      AND ($8::text IS NULL OR a.source = $8)
"#;

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =============================================================================
    //  ESCRITA (registro imutável)
    // =============================================================================

    /// Serializa eventos da mesma chave (empresa, funcionário, unidade) até o fim da transação.
    pub async fn lock_dedup_key<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        employee_id: Uuid,
        location_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let key = format!("attendance:{}:{}:{}", company_id, employee_id, location_id);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Existe evento da mesma chave capturado a partir de `cutoff`?
    pub async fn exists_since<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        employee_id: Uuid,
        location_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM attendance_log
                WHERE company_id = $1 AND employee_id = $2 AND location_id = $3
                  AND captured_at >= $4
            )
            "#,
        )
        .bind(company_id)
        .bind(employee_id)
        .bind(location_id)
        .bind(cutoff)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn insert<'e, E>(&self, executor: E, log: &NewAttendanceLog) -> Result<AttendanceLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, AttendanceLog>(&format!(
            r#"
            INSERT INTO attendance_log (
                company_id, employee_id, camera_id, location_id, type, source, confidence,
                is_late, late_minutes, is_early_departure, early_departure_minutes, overtime_minutes,
                captured_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(log.company_id)
        .bind(log.employee_id)
        .bind(log.camera_id)
        .bind(log.location_id)
        .bind(log.kind)
        .bind(log.source)
        .bind(log.confidence)
        .bind(log.metrics.is_late)
        .bind(log.metrics.late_minutes)
        .bind(log.metrics.is_early_departure)
        .bind(log.metrics.early_departure_minutes)
        .bind(log.metrics.overtime_minutes)
        .bind(log.captured_at)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    // =============================================================================
    //  LEITURA
    // =============================================================================

    pub async fn list(
        &self,
        company_id: Uuid,
        filters: &AttendanceFilters,
        page: PageParams,
    ) -> Result<(Vec<AttendanceLogItem>, i64), AppError> {
        let (_, page_size) = page.resolve();
        let search = filters.search.as_deref().filter(|s| !s.trim().is_empty());
        let from = filters.date_from.map(|d| day_bounds(d, d)).transpose()?.map(|(start, _)| start);
        let to = filters.date_to.map(|d| day_bounds(d, d)).transpose()?.map(|(_, end)| end);

        let items = sqlx::query_as::<_, AttendanceLogItem>(&format!(
            r#"
            SELECT
                a.id, a.employee_id, e.first_name, e.last_name, e.employee_code,
                e.department_id, d.name AS department_name, l.name AS location_name,
                a.type, a.source, a.confidence,
                a.is_late, a.late_minutes, a.is_early_departure, a.early_departure_minutes,
                a.overtime_minutes, a.captured_at
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            JOIN location l ON l.id = a.location_id
            LEFT JOIN department d ON d.id = e.department_id
            {}
            ORDER BY a.captured_at DESC
            LIMIT $9 OFFSET $10
            "#,
            LIST_WHERE
        ))
        .bind(company_id)
        .bind(search)
        .bind(filters.location_id)
        .bind(filters.department_id)
        .bind(from)
        .bind(to)
        .bind(filters.kind)
        .bind(filters.source)
        .bind(page_size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM attendance_log a JOIN employee e ON e.id = a.employee_id {}",
            LIST_WHERE
        ))
        .bind(company_id)
        .bind(search)
        .bind(filters.location_id)
        .bind(filters.department_id)
        .bind(from)
        .bind(to)
        .bind(filters.kind)
        .bind(filters.source)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn recent(&self, company_id: Uuid, limit: i64) -> Result<Vec<RecentActivityItem>, AppError> {
        let items = sqlx::query_as::<_, RecentActivityItem>(
            r#"
            SELECT a.id, a.employee_id, e.first_name, e.last_name, e.employee_code,
                   l.name AS location_name, a.type, a.source, a.confidence, a.captured_at
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            JOIN location l ON l.id = a.location_id
            WHERE a.company_id = $1
            ORDER BY a.captured_at DESC
            LIMIT $2
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Totais do dia a partir de `since` (meia-noite UTC de hoje).
    pub async fn today_stats(&self, company_id: Uuid, since: DateTime<Utc>) -> Result<TodayStats, AppError> {
        let (total_check_ins, unique_employees, total_enrolled): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM attendance_log WHERE company_id = $1 AND captured_at >= $2),
                (SELECT COUNT(DISTINCT employee_id) FROM attendance_log WHERE company_id = $1 AND captured_at >= $2),
                (SELECT COUNT(*) FROM employee WHERE company_id = $1 AND face_enrolled AND status = 'active')
            "#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(TodayStats {
            total_check_ins,
            unique_employees,
            total_enrolled,
            present_percentage: percentage(unique_employees, total_enrolled),
        })
    }
}

/// Percentual arredondado; denominador zero vira 0.
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::percentage;

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
    }
}
