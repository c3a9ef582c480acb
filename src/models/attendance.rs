// src/models/attendance.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceType {
    CheckIn,
    CheckOut,
}

impl AttendanceType {
    pub fn label(self) -> &'static str {
        match self {
            AttendanceType::CheckIn => "Check-in",
            AttendanceType::CheckOut => "Check-out",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceSource {
    Kiosk,
    Rtsp,
    Manual,
}

// --- REGISTRO (imutável) ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceLog {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub camera_id: Option<Uuid>,
    pub location_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: AttendanceType,
    pub source: AttendanceSource,
    pub confidence: Option<f64>,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub is_early_departure: bool,
    pub early_departure_minutes: Option<i32>,
    pub overtime_minutes: Option<i32>,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Métricas derivadas do turno. Sem turno: tudo falso/nulo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMetrics {
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub is_early_departure: bool,
    pub early_departure_minutes: Option<i32>,
    pub overtime_minutes: Option<i32>,
}

/// Dados de inserção; montado apenas pelo registrador de ponto.
#[derive(Debug, Clone)]
pub struct NewAttendanceLog {
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub camera_id: Option<Uuid>,
    pub location_id: Uuid,
    pub kind: AttendanceType,
    pub source: AttendanceSource,
    pub confidence: Option<f64>,
    pub metrics: AttendanceMetrics,
    pub captured_at: DateTime<Utc>,
}

// --- LEITURAS ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceLogItem {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub location_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: AttendanceType,
    pub source: AttendanceSource,
    pub confidence: Option<f64>,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub is_early_departure: bool,
    pub early_departure_minutes: Option<i32>,
    pub overtime_minutes: Option<i32>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityItem {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
    pub location_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: AttendanceType,
    pub source: AttendanceSource,
    pub confidence: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub total_check_ins: i64,
    pub unique_employees: i64,
    pub total_enrolled: i64,
    pub present_percentage: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilters {
    pub search: Option<String>,
    pub location_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<AttendanceType>,
    pub source: Option<AttendanceSource>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

// --- PAYLOADS / RESPOSTAS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualCheckInPayload {
    pub employee_id: Uuid,
    pub location_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
}

/// Corpo enviado pelo pipeline de câmeras (snake_case, ids opcionais para
/// devolvermos 400 explícito em vez de erro de desserialização).
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceCallbackPayload {
    pub employee_id: Option<Uuid>,
    pub camera_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub confidence: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<AttendanceType>,
    pub source: Option<AttendanceSource>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceCallbackResponse {
    pub success: bool,
    pub duplicate: bool,
}

/// Resposta do quiosque. Os três formatos possíveis compartilham o mesmo corpo:
/// não reconhecido, duplicado e registrado.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KioskCheckInResponse {
    pub identified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttendanceType>,
    pub message: String,
}

impl KioskCheckInResponse {
    pub fn not_identified(message: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            identified: false,
            duplicate: None,
            employee_name: None,
            employee_code: None,
            confidence,
            kind: None,
            message: message.into(),
        }
    }

    pub fn duplicate(employee_name: String, employee_code: String) -> Self {
        Self {
            identified: true,
            duplicate: Some(true),
            employee_name: Some(employee_name),
            employee_code: Some(employee_code),
            confidence: None,
            kind: None,
            message: "Already checked in recently".to_string(),
        }
    }

    pub fn recorded(
        employee_name: String,
        employee_code: String,
        confidence: f64,
        kind: AttendanceType,
    ) -> Self {
        Self {
            identified: true,
            duplicate: Some(false),
            employee_name: Some(employee_name),
            employee_code: Some(employee_code),
            confidence: Some(confidence),
            kind: Some(kind),
            message: format!("{} successful", kind.label()),
        }
    }
}
