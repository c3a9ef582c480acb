// src/models/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::attendance::AttendanceType;

// --- TIPOS DE RELATÓRIO ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    AttendanceOverview,
    DepartmentAnalytics,
    LeaveAnalytics,
    PunctualityOvertime,
    EmployeeDetail,
}

impl ReportKind {
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::AttendanceOverview => "Attendance Overview",
            ReportKind::DepartmentAnalytics => "Department Analytics",
            ReportKind::LeaveAnalytics => "Leave Analytics",
            ReportKind::PunctualityOvertime => "Punctuality & Overtime",
            ReportKind::EmployeeDetail => "Employee Detail",
        }
    }
}

/// Filtros aceitos pelos relatórios. Também é o formato "congelado" em `report_share.filters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Uuid>,
}

/// Período já resolvido (datas inclusivas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// =============================================================================
//  VISÃO GERAL DE PRESENÇA
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub check_ins: i64,
    pub unique_employees: i64,
    pub absent: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    pub total_check_ins: i64,
    pub avg_daily_present: i64,
    pub avg_daily_absent: i64,
    pub on_leave: i64,
    pub total_employees: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PieSlice {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceOverview {
    pub daily_trend: Vec<DailyTrendPoint>,
    pub summary: OverviewSummary,
    pub present_absent_pie: Vec<PieSlice>,
}

// =============================================================================
//  DEPARTAMENTOS
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub name: String,
    pub employee_count: i64,
    pub attendance_rate: i64,
    pub avg_late_minutes: i64,
    pub leave_rate: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAnalytics {
    pub departments: Vec<DepartmentStat>,
    pub overall_attendance_rate: i64,
}

// =============================================================================
//  AFASTAMENTOS
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveByType {
    pub name: String,
    pub count: i64,
    pub total_days: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LeaveMonthPoint {
    pub month: String,
    pub approved: i64,
    pub rejected: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSummary {
    pub total_applied: i64,
    pub total_approved: i64,
    pub total_rejected: i64,
    pub total_pending: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveAnalytics {
    pub by_type: Vec<LeaveByType>,
    pub monthly_trend: Vec<LeaveMonthPoint>,
    pub summary: LeaveSummary,
}

// =============================================================================
//  PONTUALIDADE E HORAS EXTRAS
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LateEmployee {
    pub name: String,
    pub late_count: i64,
    pub avg_late_minutes: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPunctuality {
    // "2026-W07" (ano ISO)
    pub week: String,
    pub late_count: i64,
    pub early_departure_count: i64,
    pub overtime_hours: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PunctualitySummary {
    pub total_late_arrivals: i64,
    pub total_early_departures: i64,
    pub total_overtime_hours: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PunctualityReport {
    pub top_late_employees: Vec<LateEmployee>,
    pub weekly_trend: Vec<WeeklyPunctuality>,
    pub summary: PunctualitySummary,
}

// =============================================================================
//  DETALHE DO FUNCIONÁRIO
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeHeader {
    pub name: String,
    pub code: String,
    pub department: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAttendance {
    pub month: String,
    pub days_present: i64,
    pub days_late: i64,
    pub days_on_leave: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BalanceLine {
    #[serde(rename = "type")]
    pub leave_type: String,
    pub total: i32,
    pub used: i32,
    pub remaining: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLogLine {
    pub id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: AttendanceType,
    pub captured_at: DateTime<Utc>,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub is_early_departure: bool,
    pub overtime_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetailReport {
    pub employee: EmployeeHeader,
    pub monthly_summary: Vec<MonthlyAttendance>,
    pub leave_balance: Vec<BalanceLine>,
    pub recent_logs: Vec<EmployeeLogLine>,
}

/// Qualquer um dos cinco relatórios, serializado sem etiqueta.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ReportData {
    AttendanceOverview(AttendanceOverview),
    DepartmentAnalytics(DepartmentAnalytics),
    LeaveAnalytics(LeaveAnalytics),
    PunctualityOvertime(PunctualityReport),
    EmployeeDetail(EmployeeDetailReport),
}

// =============================================================================
//  COMPARTILHAMENTO PÚBLICO
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportShare {
    pub id: Uuid,
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub token: String,
    pub report_type: ReportKind,
    pub filters: Option<Value>,
    pub title: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportShare {
    /// Filtros congelados. JSON inválido vira "sem filtros".
    pub fn frozen_filters(&self) -> ReportFilters {
        self.filters
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSharePayload {
    pub report_type: ReportKind,
    pub filters: Option<ReportFilters>,
    #[validate(length(max = 200, message = "Title must be at most 200 characters."))]
    pub title: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicReportResponse {
    pub report_type: ReportKind,
    pub title: Option<String>,
    pub date_range: DateRange,
    pub data: Option<ReportData>,
}

// =============================================================================
//  OPÇÕES DE FILTRO / PAINEL
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct NamedOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EmployeeOption {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilterOptions {
    pub departments: Vec<NamedOption>,
    pub locations: Vec<NamedOption>,
    pub employees: Vec<EmployeeOption>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub employee_count: i64,
    pub active_employee_count: i64,
    pub location_count: i64,
    pub department_count: i64,
}
