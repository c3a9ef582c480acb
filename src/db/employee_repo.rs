// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::{map_constraint_error, AppError},
        pagination::PageParams,
    },
    models::employee::{Employee, EmployeeFilters, EmployeeListItem, EmployeePayload, EmployeeStatus},
};

const EMPLOYEE_COLUMNS: &str = r#"
    id, company_id, location_id, department_id, shift_id,
    employee_code, first_name, last_name, email, phone, position,
    face_enrolled, face_enrolled_at, face_image_count, status, joined_date,
    created_at, updated_at
"#;

const DUPLICATE_CODE: &str = "An employee with this code already exists.";

// Filtros opcionais: `$n IS NULL OR ...` mantém a consulta estática.
const LIST_WHERE: &str = r#"
    WHERE e.company_id = $1
      AND ($2::text IS NULL
           OR e.first_name ILIKE '%' || $2 || '%'
           OR e.last_name ILIKE '%' || $2 || '%'
           OR e.employee_code ILIKE '%' || $2 || '%'
           OR e.email ILIKE '%' || $2 || '%')
      AND ($3::uuid IS NULL OR e.department_id = $3)
      AND ($4::uuid IS NULL OR e.location_id = $4)
      AND ($5::text IS NULL OR e.status = $5)
"#;

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        filters: &EmployeeFilters,
        page: PageParams,
    ) -> Result<(Vec<EmployeeListItem>, i64), AppError> {
        let (_, page_size) = page.resolve();
        let search = filters.search.as_deref().filter(|s| !s.trim().is_empty());

        let items = sqlx::query_as::<_, EmployeeListItem>(&format!(
            r#"
            SELECT
                e.id, e.employee_code, e.first_name, e.last_name, e.email, e.position,
                e.status, e.face_enrolled,
                e.department_id, d.name AS department_name,
                e.location_id, l.name AS location_name,
                e.shift_id, s.name AS shift_name,
                e.created_at
            FROM employee e
            JOIN location l ON l.id = e.location_id
            LEFT JOIN department d ON d.id = e.department_id
            LEFT JOIN shift s ON s.id = e.shift_id
            {}
            ORDER BY e.created_at DESC
            LIMIT $6 OFFSET $7
            "#,
            LIST_WHERE
        ))
        .bind(company_id)
        .bind(search)
        .bind(filters.department_id)
        .bind(filters.location_id)
        .bind(filters.status)
        .bind(page_size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM employee e {}", LIST_WHERE))
            .bind(company_id)
            .bind(search)
            .bind(filters.department_id)
            .bind(filters.location_id)
            .bind(filters.status)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    pub async fn find<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employee WHERE id = $1 AND company_id = $2",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    /// Apenas funcionários ativos da empresa.
    pub async fn find_active<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employee WHERE id = $1 AND company_id = $2 AND status = 'active'",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    /// Cadastro vinculado a um usuário (mesmo e-mail).
    pub async fn find_by_email(&self, company_id: Uuid, email: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employee WHERE company_id = $1 AND lower(email) = lower($2) LIMIT 1",
            EMPLOYEE_COLUMNS
        ))
        .bind(company_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &EmployeePayload,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employee (
                company_id, location_id, department_id, shift_id,
                employee_code, first_name, last_name, email, phone, position, joined_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(company_id)
        .bind(payload.location_id)
        .bind(payload.department_id)
        .bind(payload.shift_id)
        .bind(payload.employee_code.trim())
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.position.as_deref())
        .bind(payload.joined_date)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_CODE, "Invalid reference."))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        payload: &EmployeePayload,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employee SET
                location_id = $3, department_id = $4, shift_id = $5,
                employee_code = $6, first_name = $7, last_name = $8,
                email = $9, phone = $10, position = $11, joined_date = $12,
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(payload.location_id)
        .bind(payload.department_id)
        .bind(payload.shift_id)
        .bind(payload.employee_code.trim())
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.position.as_deref())
        .bind(payload.joined_date)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, DUPLICATE_CODE, "Invalid reference."))
    }

    pub async fn set_status(
        &self,
        company_id: Uuid,
        id: Uuid,
        status: EmployeeStatus,
    ) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employee SET status = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Marca (ou limpa) o cadastro facial.
    pub async fn set_enrollment(
        &self,
        company_id: Uuid,
        id: Uuid,
        face_count: Option<i32>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE employee SET
                face_enrolled = $3 IS NOT NULL,
                face_enrolled_at = CASE WHEN $3 IS NOT NULL THEN NOW() END,
                face_image_count = COALESCE($3, 0),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(face_count)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn active_ids<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employee WHERE company_id = $1 AND status = 'active'",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    /// Gerente do departamento do funcionário (se houver).
    pub async fn department_manager<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let manager = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT d.manager_id
            FROM employee e
            JOIN department d ON d.id = e.department_id
            WHERE e.id = $1 AND e.company_id = $2
            "#,
        )
        .bind(employee_id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(manager.flatten())
    }
}
