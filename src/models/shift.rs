// src/models/shift.rs

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub end_time: NaiveTime,
    pub grace_period_minutes: i32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftListItem {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub grace_period_minutes: i32,
    pub is_default: bool,
    pub employee_count: i64,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    #[schema(example = "Morning")]
    pub name: String,
    #[validate(length(min = 5, message = "Start time is required."))]
    #[schema(example = "09:00")]
    pub start_time: String,
    #[validate(length(min = 5, message = "End time is required."))]
    #[schema(example = "18:00")]
    pub end_time: String,
    #[validate(range(min = 0, max = 120, message = "Grace period must be between 0 and 120 minutes."))]
    pub grace_period_minutes: Option<i32>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignShiftPayload {
    #[validate(length(min = 1, message = "Select at least one employee."))]
    pub employee_ids: Vec<Uuid>,
    // `null` remove o turno dos funcionários
    pub shift_id: Option<Uuid>,
}
