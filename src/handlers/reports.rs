// src/handlers/reports.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{ManagerOrAbove, RequireRole},
        tenancy::TenantContext,
    },
    models::report::{
        AttendanceOverview, CreateSharePayload, CreateShareResponse, DepartmentAnalytics, EmployeeDetailReport,
        FilterOptions, LeaveAnalytics, PublicReportResponse, PunctualityReport, ReportFilters, ReportShare,
    },
    services::report_service::resolve_range,
};

const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

// =============================================================================
//  PAINEL (autenticado)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/reports/overview",
    tag = "Reports",
    params(ReportFilters),
    responses((status = 200, description = "Visão geral de presença", body = AttendanceOverview)),
    security(("api_jwt" = []))
)]
pub async fn attendance_overview(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let range = resolve_range(&filters, Utc::now().date_naive())?;
    let report = app_state
        .report_service
        .attendance_overview(tenant.company_id, range, &filters)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/departments",
    tag = "Reports",
    params(ReportFilters),
    responses((status = 200, description = "Indicadores por departamento", body = DepartmentAnalytics)),
    security(("api_jwt" = []))
)]
pub async fn department_analytics(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let range = resolve_range(&filters, Utc::now().date_naive())?;
    let report = app_state
        .report_service
        .department_analytics(tenant.company_id, range, &filters)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/leaves",
    tag = "Reports",
    params(ReportFilters),
    responses((status = 200, description = "Análise de afastamentos", body = LeaveAnalytics)),
    security(("api_jwt" = []))
)]
pub async fn leave_analytics(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let range = resolve_range(&filters, Utc::now().date_naive())?;
    let report = app_state
        .report_service
        .leave_analytics(tenant.company_id, range, &filters)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/punctuality",
    tag = "Reports",
    params(ReportFilters),
    responses((status = 200, description = "Pontualidade e horas extras", body = PunctualityReport)),
    security(("api_jwt" = []))
)]
pub async fn punctuality(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let range = resolve_range(&filters, Utc::now().date_naive())?;
    let report = app_state
        .report_service
        .punctuality(tenant.company_id, range, &filters)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/employees/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "ID do funcionário"), ReportFilters),
    responses(
        (status = 200, description = "Detalhe do funcionário", body = EmployeeDetailReport),
        (status = 404, description = "Funcionário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn employee_detail(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Path(id): Path<Uuid>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let range = resolve_range(&filters, Utc::now().date_naive())?;
    let report = app_state
        .report_service
        .employee_detail(tenant.company_id, id, range)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/filter-options",
    tag = "Reports",
    responses((status = 200, description = "Departamentos, unidades e funcionários ativos", body = FilterOptions)),
    security(("api_jwt" = []))
)]
pub async fn filter_options(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let options = app_state.report_service.filter_options(tenant.company_id).await?;
    Ok(Json(options))
}

// =============================================================================
//  LINKS PÚBLICOS (gestão)
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/reports/shares",
    tag = "Reports",
    request_body = CreateSharePayload,
    responses((status = 201, description = "Link criado", body = CreateShareResponse)),
    security(("api_jwt" = []))
)]
pub async fn create_share(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Json(payload): Json<CreateSharePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let share = app_state.report_service.create_share(&tenant, &payload).await?;
    Ok((StatusCode::CREATED, Json(share)))
}

#[utoipa::path(
    get,
    path = "/api/reports/shares",
    tag = "Reports",
    responses((status = 200, description = "Links ativos", body = Vec<ReportShare>)),
    security(("api_jwt" = []))
)]
pub async fn list_shares(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
) -> Result<impl IntoResponse, AppError> {
    let shares = app_state.report_service.list_shares(tenant.company_id).await?;
    Ok(Json(shares))
}

#[utoipa::path(
    delete,
    path = "/api/reports/shares/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "ID do link")),
    responses((status = 200, description = "Link desativado")),
    security(("api_jwt" = []))
)]
pub async fn delete_share(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<ManagerOrAbove>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.report_service.delete_share(tenant.company_id, id).await?;
    Ok(Json(json!({ "success": true })))
}

// =============================================================================
//  ACESSO PÚBLICO (sem sessão)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/reports/{token}",
    tag = "Public Reports",
    params(("token" = String, Path, description = "Token do link público")),
    responses(
        (status = 200, description = "Relatório com filtros congelados", body = PublicReportResponse),
        (status = 404, description = "Token inexistente ou desativado"),
        (status = 410, description = "Link expirado")
    )
)]
pub async fn public_report(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.public_report(&token, Utc::now()).await?;
    Ok(([(header::CACHE_CONTROL, PUBLIC_CACHE_CONTROL)], Json(report)))
}
