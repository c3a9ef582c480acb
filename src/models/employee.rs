// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Ciclo de vida do funcionário. Nunca apagamos: o histórico de ponto depende dele.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Deactivated,
}

impl EmployeeStatus {
    pub fn is_active(self) -> bool {
        self == EmployeeStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub location_id: Uuid,
    pub department_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,

    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,

    pub face_enrolled: bool,
    pub face_enrolled_at: Option<DateTime<Utc>>,
    pub face_image_count: i32,
    pub status: EmployeeStatus,
    pub joined_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Linha da listagem paginada, já com os nomes das referências
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListItem {
    pub id: Uuid,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub status: EmployeeStatus,
    pub face_enrolled: bool,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub location_id: Uuid,
    pub location_name: String,
    pub shift_id: Option<Uuid>,
    pub shift_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(length(min = 1, message = "Employee code is required."))]
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[validate(length(min = 1, message = "First name is required."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required."))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub location_id: Uuid,
    pub department_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
    pub joined_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilters {
    pub search: Option<String>,
    pub department_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status: Option<EmployeeStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResult {
    pub success: bool,
    pub face_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub detected: bool,
    pub face_count: i32,
    pub confidence: f64,
    pub message: String,
}
