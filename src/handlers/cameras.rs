// src/handlers/cameras.rs

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
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::camera::{Camera, CameraActionResponse, CameraListItem, CameraPayload, CameraStatusPayload, TestRtspPayload},
};

#[utoipa::path(
    get,
    path = "/api/cameras",
    tag = "Cameras",
    responses((status = 200, description = "Câmeras com nome da unidade", body = Vec<CameraListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_cameras(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let cameras = app_state.camera_service.list(tenant.company_id).await?;
    Ok(Json(cameras))
}

#[utoipa::path(
    post,
    path = "/api/cameras",
    tag = "Cameras",
    request_body = CameraPayload,
    responses((status = 201, description = "Câmera criada", body = Camera)),
    security(("api_jwt" = []))
)]
pub async fn create_camera(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CameraPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let camera = app_state.camera_service.create(tenant.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(camera)))
}

#[utoipa::path(
    put,
    path = "/api/cameras/{id}",
    tag = "Cameras",
    request_body = CameraPayload,
    params(("id" = Uuid, Path, description = "ID da câmera")),
    responses((status = 200, description = "Câmera atualizada", body = Camera)),
    security(("api_jwt" = []))
)]
pub async fn update_camera(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CameraPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let camera = app_state.camera_service.update(tenant.company_id, id, &payload).await?;
    Ok(Json(camera))
}

#[utoipa::path(
    delete,
    path = "/api/cameras/{id}",
    tag = "Cameras",
    params(("id" = Uuid, Path, description = "ID da câmera")),
    responses((status = 204, description = "Câmera removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_camera(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.camera_service.delete(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/cameras/{id}/status",
    tag = "Cameras",
    request_body = CameraStatusPayload,
    params(("id" = Uuid, Path, description = "ID da câmera")),
    responses((status = 200, description = "Status alterado", body = Camera)),
    security(("api_jwt" = []))
)]
pub async fn set_camera_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CameraStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let camera = app_state
        .camera_service
        .set_status(tenant.company_id, id, payload.status)
        .await?;
    Ok(Json(camera))
}

// =============================================================================
//  STREAMS (serviço facial)
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/cameras/test",
    tag = "Cameras",
    request_body = TestRtspPayload,
    responses(
        (status = 200, description = "Resultado do teste de conexão", body = CameraActionResponse),
        (status = 503, description = "Serviço facial indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn test_connection(
    State(app_state): State<AppState>,
    _tenant: TenantContext,
    Json(payload): Json<TestRtspPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let result = app_state.camera_service.test_rtsp(&payload.rtsp_url).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/cameras/{id}/start",
    tag = "Cameras",
    params(("id" = Uuid, Path, description = "ID da câmera")),
    responses((status = 200, description = "Stream iniciado", body = CameraActionResponse)),
    security(("api_jwt" = []))
)]
pub async fn start_stream(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.camera_service.start_stream(tenant.company_id, id).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/cameras/{id}/stop",
    tag = "Cameras",
    params(("id" = Uuid, Path, description = "ID da câmera")),
    responses((status = 200, description = "Stream parado", body = CameraActionResponse)),
    security(("api_jwt" = []))
)]
pub async fn stop_stream(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.camera_service.stop_stream(tenant.company_id, id).await?;
    Ok(Json(result))
}
