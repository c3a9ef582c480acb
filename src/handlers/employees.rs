// src/handlers/employees.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageParams},
    },
    config::AppState,
    handlers::upload::UploadForm,
    middleware::{
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::employee::{DetectionResult, Employee, EmployeeFilters, EmployeeListItem, EmployeePayload, EnrollmentResult},
};

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    params(PageParams, EmployeeFilters),
    responses((status = 200, description = "Lista paginada", body = Page<EmployeeListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<EmployeeFilters>,
) -> Result<impl IntoResponse, AppError> {
    let employees = app_state
        .employee_service
        .list(tenant.company_id, &filters, page)
        .await?;
    Ok(Json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Funcionário", body = Employee),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.employee_service.get(tenant.company_id, id).await?;
    Ok(Json(employee))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Funcionário criado", body = Employee),
        (status = 409, description = "Código já usado na empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<EmployeePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let employee = app_state.employee_service.create(tenant.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Employees",
    request_body = EmployeePayload,
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses((status = 200, description = "Funcionário atualizado", body = Employee)),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let employee = app_state
        .employee_service
        .update(tenant.company_id, id, &payload)
        .await?;
    Ok(Json(employee))
}

// Exclusão lógica: o histórico de presença continua apontando para o cadastro
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses((status = 200, description = "Funcionário desativado", body = Employee)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.employee_service.deactivate(tenant.company_id, id).await?;
    Ok(Json(employee))
}

// =============================================================================
//  BIOMETRIA
// =============================================================================

// multipart: um ou mais arquivos no campo `images`
#[utoipa::path(
    post,
    path = "/api/employees/{id}/enroll",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Rosto cadastrado", body = EnrollmentResult),
        (status = 400, description = "Nenhuma imagem ou rosto não detectado"),
        (status = 503, description = "Serviço facial indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn enroll_face(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let images = form.take_files("images");

    let result = app_state
        .employee_service
        .enroll_face(tenant.company_id, id, images)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}/enroll",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses((status = 204, description = "Cadastro facial removido")),
    security(("api_jwt" = []))
)]
pub async fn remove_face(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.employee_service.remove_face(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// multipart: campo `image`
#[utoipa::path(
    post,
    path = "/api/employees/detect",
    tag = "Employees",
    responses(
        (status = 200, description = "Resultado da detecção", body = DetectionResult),
        (status = 503, description = "Serviço facial indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn detect_face(
    State(app_state): State<AppState>,
    _tenant: TenantContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let image = form
        .take_files("image")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("An image is required.".into()))?;

    let result = app_state.employee_service.detect_face(image).await?;
    Ok(Json(result))
}
