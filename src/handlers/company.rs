// src/handlers/company.rs
//
// Onboarding, indicadores do painel, unidades e departamentos.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        company::{
            Department, DepartmentListItem, DepartmentPayload, Location, LocationPayload, OnboardingPayload,
            OnboardingResponse,
        },
        report::DashboardStats,
    },
};

// POST /api/onboarding
#[utoipa::path(
    post,
    path = "/api/onboarding",
    tag = "Onboarding",
    request_body = OnboardingPayload,
    responses(
        (status = 201, description = "Empresa criada e usuário promovido a super_admin", body = OnboardingResponse),
        (status = 409, description = "Usuário já pertence a uma empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn onboard(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<OnboardingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let result = app_state.company_service.onboard(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Contadores da empresa", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn dashboard_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.company_service.dashboard_stats(tenant.company_id).await?;
    Ok(Json(stats))
}

// =============================================================================
//  UNIDADES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Locations",
    responses((status = 200, description = "Unidades da empresa", body = Vec<Location>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let locations = app_state.company_service.list_locations(tenant.company_id).await?;
    Ok(Json(locations))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Locations",
    request_body = LocationPayload,
    responses(
        (status = 201, description = "Unidade criada", body = Location),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<LocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let location = app_state
        .company_service
        .create_location(tenant.company_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    tag = "Locations",
    request_body = LocationPayload,
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade atualizada", body = Location),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let location = app_state
        .company_service
        .update_location(tenant.company_id, id, &payload)
        .await?;
    Ok(Json(location))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 204, description = "Unidade removida"),
        (status = 409, description = "Unidade ainda referenciada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_location(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete_location(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  DEPARTAMENTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "Departments",
    responses((status = 200, description = "Departamentos com gerente e contagem", body = Vec<DepartmentListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_departments(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let departments = app_state.company_service.list_departments(tenant.company_id).await?;
    Ok(Json(departments))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "Departments",
    request_body = DepartmentPayload,
    responses(
        (status = 201, description = "Departamento criado", body = Department),
        (status = 404, description = "Gerente não pertence à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_department(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let department = app_state
        .company_service
        .create_department(tenant.company_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    tag = "Departments",
    request_body = DepartmentPayload,
    params(("id" = Uuid, Path, description = "ID do departamento")),
    responses((status = 200, description = "Departamento atualizado", body = Department)),
    security(("api_jwt" = []))
)]
pub async fn update_department(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let department = app_state
        .company_service
        .update_department(tenant.company_id, id, &payload)
        .await?;
    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "Departments",
    params(("id" = Uuid, Path, description = "ID do departamento")),
    responses((status = 204, description = "Departamento removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_department(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete_department(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
