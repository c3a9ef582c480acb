// src/db/report_repo.rs
//
// Consultas de agregação dos relatórios. Nenhuma função aqui depende de sessão:
// o `company_id` vem sempre explícito (painel autenticado ou link público).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        dates::{day_bounds, iso_week_label},
        error::AppError,
    },
    models::report::{
        BalanceLine, EmployeeLogLine, EmployeeOption, LeaveByType, LeaveMonthPoint, LeaveSummary, NamedOption,
        PunctualitySummary, ReportKind, ReportShare, WeeklyPunctuality,
    },
};

const SHARE_COLUMNS: &str =
    "id, company_id, created_by, token, report_type, filters, title, expires_at, is_active, created_at, updated_at";

/// Recorte já resolvido de um relatório: empresa, período e filtros opcionais.
#[derive(Debug, Clone, Copy)]
pub struct ReportWindow {
    pub company_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub department_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

impl ReportWindow {
    fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        day_bounds(self.from, self.to)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyRow {
    pub day: NaiveDate,
    pub check_ins: i64,
    pub unique_employees: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DepartmentRow {
    pub name: String,
    pub employee_count: i64,
    pub present_days: i64,
    pub avg_late_minutes: f64,
    pub leave_days: i64,
}

#[derive(Debug, Clone, FromRow)]
struct WeekRow {
    week_start: NaiveDate,
    late_count: i64,
    early_departure_count: i64,
    overtime_hours: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct LateRow {
    pub name: String,
    pub late_count: i64,
    pub avg_late_minutes: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct EmployeeHeaderRow {
    pub name: String,
    pub code: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthRow {
    pub month: String,
    pub days_present: i64,
    pub days_late: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthLeaveRow {
    pub month: String,
    pub days_on_leave: i64,
}

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =============================================================================
    //  ÁREA 1: PRESENÇA
    // =============================================================================

    /// Entradas por dia (UTC) no período.
    pub async fn daily_check_ins(&self, w: &ReportWindow) -> Result<Vec<DailyRow>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, DailyRow>(
            r#"
            SELECT
                (a.captured_at AT TIME ZONE 'UTC')::date AS day,
                COUNT(*) AS check_ins,
                COUNT(DISTINCT a.employee_id) AS unique_employees
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            WHERE a.company_id = $1
              AND a.type = 'check_in'
              AND a.captured_at >= $2 AND a.captured_at < $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR a.location_id = $5)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(w.company_id)
        .bind(start)
        .bind(end)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn active_employee_count(&self, w: &ReportWindow) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM employee
            WHERE company_id = $1 AND status = 'active'
              AND ($2::uuid IS NULL OR department_id = $2)
              AND ($3::uuid IS NULL OR location_id = $3)
            "#,
        )
        .bind(w.company_id)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Afastamentos aprovados que cruzam o período.
    pub async fn approved_leaves_overlapping(&self, w: &ReportWindow) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM leave l
            JOIN employee e ON e.id = l.employee_id
            WHERE l.company_id = $1
              AND l.status = 'approved'
              AND l.start_date <= $3 AND l.end_date >= $2
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR e.location_id = $5)
            "#,
        )
        .bind(w.company_id)
        .bind(w.from)
        .bind(w.to)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =============================================================================
    //  ÁREA 2: DEPARTAMENTOS
    // =============================================================================

    /// Uma linha por departamento com os insumos das taxas (dias presentes, atraso médio, dias de afastamento).
    pub async fn department_rows(&self, w: &ReportWindow) -> Result<Vec<DepartmentRow>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT
                d.name,
                (SELECT COUNT(*) FROM employee e
                  WHERE e.department_id = d.id AND e.status = 'active'
                    AND ($7::uuid IS NULL OR e.location_id = $7)) AS employee_count,
                (SELECT COUNT(DISTINCT a.employee_id::text || ':' || ((a.captured_at AT TIME ZONE 'UTC')::date)::text)
                   FROM attendance_log a JOIN employee e ON e.id = a.employee_id
                  WHERE a.company_id = $1 AND e.department_id = d.id AND a.type = 'check_in'
                    AND a.captured_at >= $2 AND a.captured_at < $3
                    AND ($7::uuid IS NULL OR a.location_id = $7)) AS present_days,
                (SELECT COALESCE(AVG(a.late_minutes), 0)::float8
                   FROM attendance_log a JOIN employee e ON e.id = a.employee_id
                  WHERE a.company_id = $1 AND e.department_id = d.id AND a.is_late
                    AND a.captured_at >= $2 AND a.captured_at < $3
                    AND ($7::uuid IS NULL OR a.location_id = $7)) AS avg_late_minutes,
                (SELECT COALESCE(SUM(l.days_count), 0)::bigint
                   FROM leave l JOIN employee e ON e.id = l.employee_id
                  WHERE l.company_id = $1 AND e.department_id = d.id AND l.status = 'approved'
                    AND l.start_date <= $5 AND l.end_date >= $4
                    AND ($7::uuid IS NULL OR e.location_id = $7)) AS leave_days
            FROM department d
            WHERE d.company_id = $1
              AND ($6::uuid IS NULL OR d.id = $6)
            ORDER BY d.name
            "#,
        )
        .bind(w.company_id)
        .bind(start)
        .bind(end)
        .bind(w.from)
        .bind(w.to)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =============================================================================
    //  ÁREA 3: AFASTAMENTOS (pedidos contidos no período)
    // =============================================================================

    pub async fn leaves_by_type(&self, w: &ReportWindow) -> Result<Vec<LeaveByType>, AppError> {
        let rows = sqlx::query_as::<_, LeaveByType>(
            r#"
            SELECT t.name, COUNT(*) AS count, COALESCE(SUM(l.days_count), 0)::bigint AS total_days
            FROM leave l
            JOIN leave_type t ON t.id = l.leave_type_id
            JOIN employee e ON e.id = l.employee_id
            WHERE l.company_id = $1
              AND l.start_date >= $2 AND l.end_date <= $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR e.location_id = $5)
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(w.company_id)
        .bind(w.from)
        .bind(w.to)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn leaves_by_month(&self, w: &ReportWindow) -> Result<Vec<LeaveMonthPoint>, AppError> {
        let rows = sqlx::query_as::<_, LeaveMonthPoint>(
            r#"
            SELECT
                to_char(l.start_date, 'YYYY-MM') AS month,
                COUNT(*) FILTER (WHERE l.status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE l.status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE l.status = 'pending') AS pending
            FROM leave l
            JOIN employee e ON e.id = l.employee_id
            WHERE l.company_id = $1
              AND l.start_date >= $2 AND l.end_date <= $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR e.location_id = $5)
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(w.company_id)
        .bind(w.from)
        .bind(w.to)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn leave_summary(&self, w: &ReportWindow) -> Result<LeaveSummary, AppError> {
        let summary = sqlx::query_as::<_, LeaveSummary>(
            r#"
            SELECT
                COUNT(*) AS total_applied,
                COUNT(*) FILTER (WHERE l.status = 'approved') AS total_approved,
                COUNT(*) FILTER (WHERE l.status = 'rejected') AS total_rejected,
                COUNT(*) FILTER (WHERE l.status = 'pending') AS total_pending
            FROM leave l
            JOIN employee e ON e.id = l.employee_id
            WHERE l.company_id = $1
              AND l.start_date >= $2 AND l.end_date <= $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR e.location_id = $5)
            "#,
        )
        .bind(w.company_id)
        .bind(w.from)
        .bind(w.to)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    // =============================================================================
    //  ÁREA 4: PONTUALIDADE
    // =============================================================================

    /// Até 10 funcionários com mais entradas atrasadas.
    pub async fn top_late(&self, w: &ReportWindow) -> Result<Vec<LateRow>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, LateRow>(
            r#"
            SELECT
                e.first_name || ' ' || e.last_name AS name,
                COUNT(*) FILTER (WHERE a.is_late) AS late_count,
                COALESCE(AVG(a.late_minutes) FILTER (WHERE a.is_late), 0)::float8 AS avg_late_minutes
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            WHERE a.company_id = $1
              AND a.type = 'check_in'
              AND a.captured_at >= $2 AND a.captured_at < $3
              AND e.status = 'active'
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR e.location_id = $5)
            GROUP BY e.id, e.first_name, e.last_name
            HAVING COUNT(*) FILTER (WHERE a.is_late) > 0
            ORDER BY late_count DESC, name
            LIMIT 10
            "#,
        )
        .bind(w.company_id)
        .bind(start)
        .bind(end)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Semanas ISO (segunda a domingo); horas extras em horas com 1 casa.
    pub async fn weekly_punctuality(&self, w: &ReportWindow) -> Result<Vec<WeeklyPunctuality>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, WeekRow>(
            r#"
            SELECT
                date_trunc('week', a.captured_at AT TIME ZONE 'UTC')::date AS week_start,
                COUNT(*) FILTER (WHERE a.is_late) AS late_count,
                COUNT(*) FILTER (WHERE a.is_early_departure) AS early_departure_count,
                COALESCE(ROUND(SUM(a.overtime_minutes) FILTER (WHERE a.overtime_minutes > 0)::numeric / 60, 1), 0)
                    AS overtime_hours
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            WHERE a.company_id = $1
              AND a.captured_at >= $2 AND a.captured_at < $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR a.location_id = $5)
            GROUP BY date_trunc('week', a.captured_at AT TIME ZONE 'UTC')
            ORDER BY date_trunc('week', a.captured_at AT TIME ZONE 'UTC')
            "#,
        )
        .bind(w.company_id)
        .bind(start)
        .bind(end)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WeeklyPunctuality {
                week: iso_week_label(r.week_start),
                late_count: r.late_count,
                early_departure_count: r.early_departure_count,
                overtime_hours: r.overtime_hours,
            })
            .collect())
    }

    pub async fn punctuality_summary(&self, w: &ReportWindow) -> Result<PunctualitySummary, AppError> {
        let (start, end) = w.bounds()?;
        let summary = sqlx::query_as::<_, PunctualitySummary>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE a.is_late) AS total_late_arrivals,
                COUNT(*) FILTER (WHERE a.is_early_departure) AS total_early_departures,
                COALESCE(ROUND(SUM(a.overtime_minutes) FILTER (WHERE a.overtime_minutes > 0)::numeric / 60, 1), 0)
                    AS total_overtime_hours
            FROM attendance_log a
            JOIN employee e ON e.id = a.employee_id
            WHERE a.company_id = $1
              AND a.captured_at >= $2 AND a.captured_at < $3
              AND ($4::uuid IS NULL OR e.department_id = $4)
              AND ($5::uuid IS NULL OR a.location_id = $5)
            "#,
        )
        .bind(w.company_id)
        .bind(start)
        .bind(end)
        .bind(w.department_id)
        .bind(w.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    // =============================================================================
    //  ÁREA 5: DETALHE DO FUNCIONÁRIO
    // =============================================================================

    pub async fn employee_header(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<EmployeeHeaderRow>, AppError> {
        let row = sqlx::query_as::<_, EmployeeHeaderRow>(
            r#"
            SELECT e.first_name || ' ' || e.last_name AS name, e.employee_code AS code, d.name AS department
            FROM employee e
            LEFT JOIN department d ON d.id = e.department_id
            WHERE e.id = $1 AND e.company_id = $2
            "#,
        )
        .bind(employee_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn employee_months(&self, w: &ReportWindow, employee_id: Uuid) -> Result<Vec<MonthRow>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, MonthRow>(
            r#"
            SELECT
                to_char(a.captured_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month,
                COUNT(DISTINCT (a.captured_at AT TIME ZONE 'UTC')::date) AS days_present,
                COUNT(*) FILTER (WHERE a.is_late) AS days_late
            FROM attendance_log a
            WHERE a.company_id = $1 AND a.employee_id = $2
              AND a.type = 'check_in'
              AND a.captured_at >= $3 AND a.captured_at < $4
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(w.company_id)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Dias de afastamento aprovados, agrupados pelo mês de início.
    pub async fn employee_leave_months(&self, w: &ReportWindow, employee_id: Uuid) -> Result<Vec<MonthLeaveRow>, AppError> {
        let rows = sqlx::query_as::<_, MonthLeaveRow>(
            r#"
            SELECT to_char(l.start_date, 'YYYY-MM') AS month, SUM(l.days_count)::bigint AS days_on_leave
            FROM leave l
            WHERE l.company_id = $1 AND l.employee_id = $2
              AND l.status = 'approved'
              AND l.start_date >= $3 AND l.end_date <= $4
            GROUP BY month
            "#,
        )
        .bind(w.company_id)
        .bind(employee_id)
        .bind(w.from)
        .bind(w.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn employee_balances(&self, company_id: Uuid, employee_id: Uuid, year: i32) -> Result<Vec<BalanceLine>, AppError> {
        let rows = sqlx::query_as::<_, BalanceLine>(
            r#"
            SELECT t.name AS leave_type, b.total_days AS total, b.used_days AS used, b.remaining_days AS remaining
            FROM leave_balance b
            JOIN leave_type t ON t.id = b.leave_type_id
            WHERE t.company_id = $1 AND b.employee_id = $2 AND b.year = $3
            ORDER BY t.name
            "#,
        )
        .bind(company_id)
        .bind(employee_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn employee_recent_logs(&self, w: &ReportWindow, employee_id: Uuid) -> Result<Vec<EmployeeLogLine>, AppError> {
        let (start, end) = w.bounds()?;
        let rows = sqlx::query_as::<_, EmployeeLogLine>(
            r#"
            SELECT id, type, captured_at, is_late, late_minutes, is_early_departure, overtime_minutes
            FROM attendance_log
            WHERE company_id = $1 AND employee_id = $2
              AND captured_at >= $3 AND captured_at < $4
            ORDER BY captured_at DESC
            LIMIT 50
            "#,
        )
        .bind(w.company_id)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =============================================================================
    //  ÁREA 6: OPÇÕES DE FILTRO
    // =============================================================================

    pub async fn filter_departments(&self, company_id: Uuid) -> Result<Vec<NamedOption>, AppError> {
        let rows = sqlx::query_as::<_, NamedOption>("SELECT id, name FROM department WHERE company_id = $1 ORDER BY name")
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn filter_locations(&self, company_id: Uuid) -> Result<Vec<NamedOption>, AppError> {
        let rows = sqlx::query_as::<_, NamedOption>(
            "SELECT id, name FROM location WHERE company_id = $1 AND is_active ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn filter_employees(&self, company_id: Uuid) -> Result<Vec<EmployeeOption>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeOption>(
            r#"
            SELECT id, first_name || ' ' || last_name AS name, employee_code AS code
            FROM employee
            WHERE company_id = $1 AND status = 'active'
            ORDER BY first_name, last_name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =============================================================================
    //  ÁREA 7: LINKS PÚBLICOS
    // =============================================================================

    pub async fn create_share(
        &self,
        company_id: Uuid,
        created_by: Uuid,
        token: &str,
        report_type: ReportKind,
        filters: Option<Value>,
        title: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ReportShare, AppError> {
        let share = sqlx::query_as::<_, ReportShare>(&format!(
            r#"
            INSERT INTO report_share (company_id, created_by, token, report_type, filters, title, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SHARE_COLUMNS
        ))
        .bind(company_id)
        .bind(created_by)
        .bind(token)
        .bind(report_type)
        .bind(filters)
        .bind(title)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(share)
    }

    pub async fn list_active_shares(&self, company_id: Uuid) -> Result<Vec<ReportShare>, AppError> {
        let shares = sqlx::query_as::<_, ReportShare>(&format!(
            "SELECT {} FROM report_share WHERE company_id = $1 AND is_active ORDER BY created_at DESC",
            SHARE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shares)
    }

    pub async fn deactivate_share(&self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE report_share SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Somente links ativos; a expiração é verificada pelo chamador.
    pub async fn find_active_by_token(&self, token: &str) -> Result<Option<ReportShare>, AppError> {
        let share = sqlx::query_as::<_, ReportShare>(&format!(
            "SELECT {} FROM report_share WHERE token = $1 AND is_active",
            SHARE_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(share)
    }
}
