// src/db/company_repo.rs
//
// Empresa (tenant), unidades e departamentos.

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint_error, AppError},
    models::{
        company::{Company, Department, DepartmentListItem, Location},
        report::DashboardStats,
    },
};

const LOCATION_COLUMNS: &str =
    "id, company_id, name, address, city, timezone, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =============================================================================
    //  EMPRESA
    // =============================================================================

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        industry: Option<&str>,
        size: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO company (name, industry, size)
            VALUES ($1, $2, $3)
            RETURNING id, name, industry, size, plan_tier, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(industry)
        .bind(size)
        .fetch_one(executor)
        .await?;
        Ok(company)
    }

    pub async fn dashboard_stats(&self, company_id: Uuid) -> Result<DashboardStats, AppError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employee WHERE company_id = $1) AS employee_count,
                (SELECT COUNT(*) FROM employee WHERE company_id = $1 AND status = 'active') AS active_employee_count,
                (SELECT COUNT(*) FROM location WHERE company_id = $1) AS location_count,
                (SELECT COUNT(*) FROM department WHERE company_id = $1) AS department_count
            "#,
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    // =============================================================================
    //  UNIDADES (LOCATIONS)
    // =============================================================================

    pub async fn create_location<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        address: Option<&str>,
        city: &str,
        timezone: &str,
    ) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO location (company_id, name, address, city, timezone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(company_id)
        .bind(name)
        .bind(address)
        .bind(city)
        .bind(timezone)
        .fetch_one(executor)
        .await?;
        Ok(location)
    }

    pub async fn list_locations(&self, company_id: Uuid) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM location WHERE company_id = $1 ORDER BY name",
            LOCATION_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    pub async fn find_location<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM location WHERE id = $1 AND company_id = $2",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(location)
    }

    pub async fn update_location(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
        address: Option<&str>,
        city: &str,
        timezone: &str,
        is_active: Option<bool>,
    ) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE location
            SET name = $3, address = $4, city = $5, timezone = $6,
                is_active = COALESCE($7, is_active), updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(address)
        .bind(city)
        .bind(timezone)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(location)
    }

    pub async fn delete_location(&self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM location WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    "Location already exists.",
                    "Failed to delete location. It may have employees or cameras assigned.",
                )
            })?;
        Ok(result.rows_affected())
    }

    // =============================================================================
    //  DEPARTAMENTOS
    // =============================================================================

    pub async fn list_departments(&self, company_id: Uuid) -> Result<Vec<DepartmentListItem>, AppError> {
        let departments = sqlx::query_as::<_, DepartmentListItem>(
            r#"
            SELECT
                d.id, d.name, d.manager_id,
                u.name AS manager_name,
                (SELECT COUNT(*) FROM employee e
                  WHERE e.department_id = d.id AND e.status = 'active') AS employee_count,
                d.created_at
            FROM department d
            LEFT JOIN users u ON u.id = d.manager_id
            WHERE d.company_id = $1
            ORDER BY d.name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn create_department(
        &self,
        company_id: Uuid,
        name: &str,
        manager_id: Option<Uuid>,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO department (company_id, name, manager_id)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, manager_id, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(manager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn update_department(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
        manager_id: Option<Uuid>,
    ) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            UPDATE department SET name = $3, manager_id = $4, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING id, company_id, name, manager_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn delete_department(&self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM department WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    "Department already exists.",
                    "Failed to delete department. It may have employees assigned.",
                )
            })?;
        Ok(result.rows_affected())
    }
}
