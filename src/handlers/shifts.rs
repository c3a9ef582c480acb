// src/handlers/shifts.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::shift::{AssignShiftPayload, Shift, ShiftListItem, ShiftPayload},
};

#[utoipa::path(
    get,
    path = "/api/shifts",
    tag = "Shifts",
    responses((status = 200, description = "Turnos com número de funcionários", body = Vec<ShiftListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_shifts(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let shifts = app_state.shift_service.list(tenant.company_id).await?;
    Ok(Json(shifts))
}

#[utoipa::path(
    post,
    path = "/api/shifts",
    tag = "Shifts",
    request_body = ShiftPayload,
    responses(
        (status = 201, description = "Turno criado", body = Shift),
        (status = 400, description = "Horário inválido ou fim antes do início")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shift(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<ShiftPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let shift = app_state.shift_service.create(tenant.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

#[utoipa::path(
    put,
    path = "/api/shifts/{id}",
    tag = "Shifts",
    request_body = ShiftPayload,
    params(("id" = Uuid, Path, description = "ID do turno")),
    responses(
        (status = 200, description = "Turno atualizado", body = Shift),
        (status = 404, description = "Turno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_shift(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShiftPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let shift = app_state.shift_service.update(tenant.company_id, id, &payload).await?;
    Ok(Json(shift))
}

#[utoipa::path(
    delete,
    path = "/api/shifts/{id}",
    tag = "Shifts",
    params(("id" = Uuid, Path, description = "ID do turno")),
    responses((status = 204, description = "Turno removido; funcionários ficam sem turno")),
    security(("api_jwt" = []))
)]
pub async fn delete_shift(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.shift_service.delete(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/shifts/assign",
    tag = "Shifts",
    request_body = AssignShiftPayload,
    responses((status = 200, description = "Quantidade de funcionários atualizados")),
    security(("api_jwt" = []))
)]
pub async fn assign_shift(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<AssignShiftPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state.shift_service.assign(tenant.company_id, &payload).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}
