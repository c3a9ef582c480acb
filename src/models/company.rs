// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub plan_tier: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: String,
    // Nome IANA (ex.: "America/Sao_Paulo")
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da listagem (com gerente e contagem de funcionários)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentListItem {
    pub id: Uuid,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub manager_name: Option<String>,
    pub employee_count: i64,
    pub created_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPayload {
    #[validate(length(min = 2, message = "Company name must be at least 2 characters."))]
    #[schema(example = "Acme Ltda")]
    pub company_name: String,
    pub industry: Option<String>,
    pub size: Option<String>,

    #[validate(length(min = 2, message = "Location name must be at least 2 characters."))]
    #[schema(example = "Head Office")]
    pub location_name: String,
    pub location_address: Option<String>,
    #[validate(length(min = 2, message = "City is required."))]
    pub location_city: String,
    #[schema(example = "America/Sao_Paulo")]
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub company: Company,
    pub location: Location,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    pub address: Option<String>,
    #[validate(length(min = 2, message = "City is required."))]
    pub city: String,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    #[schema(example = "Engineering")]
    pub name: String,
    pub manager_id: Option<Uuid>,
}
