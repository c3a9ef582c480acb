// src/db/leave_repo.rs
//
// Tipos de afastamento, saldos anuais e pedidos.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::leave::{Leave, LeaveBalance, LeaveBalanceView, LeaveFilters, LeaveListItem, LeaveStatus, LeaveType},
};

const TYPE_COLUMNS: &str = "id, company_id, name, days_per_year, is_active, created_at, updated_at";
const BALANCE_COLUMNS: &str = "id, employee_id, leave_type_id, total_days, used_days, remaining_days, year";
const LEAVE_COLUMNS: &str = r#"
    id, company_id, employee_id, leave_type_id, start_date, end_date, days_count, reason,
    status, approved_by, approved_at, rejection_reason, created_at, updated_at
"#;

// $2 = gerente (escopo de equipe), $3 = funcionário (escopo próprio)
const LIST_WHERE: &str = r#"
    WHERE l.company_id = $1
      AND ($2::uuid IS NULL OR d.manager_id = $2)
      AND ($3::uuid IS NULL OR l.employee_id = $3)
      AND ($4::text IS NULL
           OR e.first_name ILIKE '%' || $4 || '%'
           OR e.last_name ILIKE '%' || $4 || '%'
           OR e.employee_code ILIKE '%' || $4 || '%')
      AND ($5::text IS NULL OR l.status = $5)
      AND ($6::uuid IS NULL OR l.employee_id = $6)
"#;

/// Dados de um novo pedido (status inicial sempre `pending`).
#[derive(Debug, Clone)]
pub struct NewLeave<'a> {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_count: i32,
    pub reason: Option<&'a str>,
}

#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =============================================================================
    //  ÁREA 1: TIPOS
    // =============================================================================

    pub async fn list_types(&self, company_id: Uuid) -> Result<Vec<LeaveType>, AppError> {
        let types = sqlx::query_as::<_, LeaveType>(&format!(
            "SELECT {} FROM leave_type WHERE company_id = $1 ORDER BY name",
            TYPE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn find_type<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<LeaveType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave_type = sqlx::query_as::<_, LeaveType>(&format!(
            "SELECT {} FROM leave_type WHERE id = $1 AND company_id = $2",
            TYPE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(leave_type)
    }

    pub async fn create_type<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        days_per_year: i32,
        is_active: bool,
    ) -> Result<LeaveType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave_type = sqlx::query_as::<_, LeaveType>(&format!(
            r#"
            INSERT INTO leave_type (company_id, name, days_per_year, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TYPE_COLUMNS
        ))
        .bind(company_id)
        .bind(name)
        .bind(days_per_year)
        .bind(is_active)
        .fetch_one(executor)
        .await?;
        Ok(leave_type)
    }

    pub async fn update_type(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
        days_per_year: i32,
        is_active: Option<bool>,
    ) -> Result<Option<LeaveType>, AppError> {
        // `is_active` ausente mantém o valor gravado.
        let leave_type = sqlx::query_as::<_, LeaveType>(&format!(
            r#"
            UPDATE leave_type
            SET name = $3, days_per_year = $4, is_active = COALESCE($5, is_active), updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            TYPE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(days_per_year)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(leave_type)
    }

    pub async fn type_has_leaves<'e, E>(&self, executor: E, leave_type_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM leave WHERE leave_type_id = $1)")
            .bind(leave_type_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn delete_type<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leave_type WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =============================================================================
    //  ÁREA 2: SALDOS
    // =============================================================================

    /// Cria saldo cheio para cada funcionário; linhas já existentes são mantidas.
    pub async fn backfill_balances<'e, E>(
        &self,
        executor: E,
        leave_type_id: Uuid,
        employee_ids: &[Uuid],
        days: i32,
        year: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_balance (employee_id, leave_type_id, total_days, used_days, remaining_days, year)
            SELECT emp_id, $2, $3, 0, $3, $4 FROM UNNEST($1::uuid[]) AS emp_id
            ON CONFLICT (employee_id, leave_type_id, year) DO NOTHING
            "#,
        )
        .bind(employee_ids)
        .bind(leave_type_id)
        .bind(days)
        .bind(year)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_balances_for_type<'e, E>(&self, executor: E, leave_type_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leave_balance WHERE leave_type_id = $1")
            .bind(leave_type_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_balance<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, LeaveBalance>(&format!(
            "SELECT {} FROM leave_balance WHERE employee_id = $1 AND leave_type_id = $2 AND year = $3",
            BALANCE_COLUMNS
        ))
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Débito atômico: só acontece se houver saldo suficiente. `None` = linha ausente ou saldo curto.
    pub async fn debit_balance<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        days: i32,
    ) -> Result<Option<LeaveBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, LeaveBalance>(&format!(
            r#"
            UPDATE leave_balance
            SET used_days = used_days + $4, remaining_days = remaining_days - $4, updated_at = NOW()
            WHERE employee_id = $1 AND leave_type_id = $2 AND year = $3 AND remaining_days >= $4
            RETURNING {}
            "#,
            BALANCE_COLUMNS
        ))
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .bind(days)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Estorno: `used` nunca fica negativo e `remaining` é recalculado a partir dele.
    pub async fn credit_balance<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        days: i32,
    ) -> Result<Option<LeaveBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, LeaveBalance>(&format!(
            r#"
            UPDATE leave_balance
            SET used_days = GREATEST(used_days - $4, 0),
                remaining_days = total_days - GREATEST(used_days - $4, 0),
                updated_at = NOW()
            WHERE employee_id = $1 AND leave_type_id = $2 AND year = $3
            RETURNING {}
            "#,
            BALANCE_COLUMNS
        ))
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .bind(days)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Saldos do funcionário no ano, com o nome do tipo. Escopo de empresa pelo tipo.
    pub async fn list_balances(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        year: i32,
    ) -> Result<Vec<LeaveBalanceView>, AppError> {
        let balances = sqlx::query_as::<_, LeaveBalanceView>(
            r#"
            SELECT b.id, b.leave_type_id, t.name AS leave_type_name,
                   b.total_days, b.used_days, b.remaining_days, b.year
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
        Ok(balances)
    }

    // =============================================================================
    //  ÁREA 3: PEDIDOS
    // =============================================================================

    pub async fn insert_leave<'e, E>(&self, executor: E, new: &NewLeave<'_>) -> Result<Leave, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave = sqlx::query_as::<_, Leave>(&format!(
            r#"
            INSERT INTO leave (company_id, employee_id, leave_type_id, start_date, end_date, days_count, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LEAVE_COLUMNS
        ))
        .bind(new.company_id)
        .bind(new.employee_id)
        .bind(new.leave_type_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.days_count)
        .bind(new.reason)
        .fetch_one(executor)
        .await?;
        Ok(leave)
    }

    /// Lê o pedido travando a linha até o fim da transação.
    pub async fn find_leave_for_update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Leave>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave = sqlx::query_as::<_, Leave>(&format!(
            "SELECT {} FROM leave WHERE id = $1 AND company_id = $2 FOR UPDATE",
            LEAVE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(leave)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
        rejection_reason: Option<&str>,
    ) -> Result<Leave, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leave = sqlx::query_as::<_, Leave>(&format!(
            r#"
            UPDATE leave SET
                status = $2,
                approved_by = COALESCE($3, approved_by),
                approved_at = COALESCE($4, approved_at),
                rejection_reason = COALESCE($5, rejection_reason),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LEAVE_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(decided_at)
        .bind(rejection_reason)
        .fetch_one(executor)
        .await?;
        Ok(leave)
    }

    /// Listagem paginada já restrita pelo escopo (gerente / funcionário).
    pub async fn list_leaves(
        &self,
        company_id: Uuid,
        scope: (Option<Uuid>, Option<Uuid>),
        filters: &LeaveFilters,
        page: PageParams,
    ) -> Result<(Vec<LeaveListItem>, i64), AppError> {
        let (_, page_size) = page.resolve();
        let (manager_id, own_employee) = scope;
        let search = filters.search.as_deref().filter(|s| !s.trim().is_empty());

        let items = sqlx::query_as::<_, LeaveListItem>(&format!(
            r#"
            SELECT
                l.id, l.employee_id, e.first_name, e.last_name, e.employee_code,
                l.leave_type_id, t.name AS leave_type_name,
                l.start_date, l.end_date, l.days_count, l.reason, l.status,
                l.approved_by, l.approved_at, l.rejection_reason, l.created_at
            FROM leave l
            JOIN employee e ON e.id = l.employee_id
            JOIN leave_type t ON t.id = l.leave_type_id
            LEFT JOIN department d ON d.id = e.department_id
            {}
            ORDER BY l.created_at DESC
            LIMIT $7 OFFSET $8
            "#,
            LIST_WHERE
        ))
        .bind(company_id)
        .bind(manager_id)
        .bind(own_employee)
        .bind(search)
        .bind(filters.status)
        .bind(filters.employee_id)
        .bind(page_size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM leave l
            JOIN employee e ON e.id = l.employee_id
            LEFT JOIN department d ON d.id = e.department_id
            {}
            "#,
            LIST_WHERE
        ))
        .bind(company_id)
        .bind(manager_id)
        .bind(own_employee)
        .bind(search)
        .bind(filters.status)
        .bind(filters.employee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }
}
