// src/common/db_utils.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper de Isolamento: garante que um id pertence à empresa da sessão
// ---

/// Tabelas que podem ser referenciadas por id vindo do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedTable {
    Location,
    Department,
    Shift,
    Employee,
    Camera,
    LeaveType,
    Leave,
    User,
}

impl OwnedTable {
    fn table(self) -> &'static str {
        match self {
            OwnedTable::Location => "location",
            OwnedTable::Department => "department",
            OwnedTable::Shift => "shift",
            OwnedTable::Employee => "employee",
            OwnedTable::Camera => "camera",
            OwnedTable::LeaveType => "leave_type",
            OwnedTable::Leave => "leave",
            OwnedTable::User => "users",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OwnedTable::Location => "Location",
            OwnedTable::Department => "Department",
            OwnedTable::Shift => "Shift",
            OwnedTable::Employee => "Employee",
            OwnedTable::Camera => "Camera",
            OwnedTable::LeaveType => "Leave type",
            OwnedTable::Leave => "Leave request",
            OwnedTable::User => "User",
        }
    }
}

/// Verifica que `id` existe E pertence a `company_id`.
/// Um id de outra empresa responde exatamente como um id inexistente (404).
pub(crate) async fn ensure_in_company<'e, E>(
    executor: E,
    table: OwnedTable,
    id: Uuid,
    company_id: Uuid,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    // O nome da tabela vem de um enum fechado, nunca do cliente.
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND company_id = $2)",
        table.table()
    );

    let exists: bool = sqlx::query_scalar(&sql)
        .bind(id)
        .bind(company_id)
        .fetch_one(executor)
        .await?;

    if !exists {
        return Err(AppError::NotFound(table.label()));
    }
    Ok(())
}

/// Variante para referências opcionais (ex.: department_id nulo).
pub(crate) async fn ensure_optional_in_company<'e, E>(
    executor: E,
    table: OwnedTable,
    id: Option<Uuid>,
    company_id: Uuid,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    match id {
        Some(id) => ensure_in_company(executor, table, id, company_id).await,
        None => Ok(()),
    }
}
