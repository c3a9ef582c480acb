// src/handlers/attendance.rs

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
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
    models::attendance::{
        AttendanceCallbackPayload, AttendanceCallbackResponse, AttendanceFilters, AttendanceLog, AttendanceLogItem,
        AttendanceType, KioskCheckInResponse, ManualCheckInPayload, RecentActivityItem, RecentParams, TodayStats,
    },
};

const API_SECRET_HEADER: &str = "x-api-secret";

/// Sem segredo configurado, a verificação é ignorada.
pub fn check_api_secret(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    match expected {
        Some(secret) if provided != Some(secret) => Err(AppError::ApiSecretMismatch),
        _ => Ok(()),
    }
}

fn parse_kind(value: Option<&str>) -> Result<AttendanceType, AppError> {
    match value {
        Some("check_in") => Ok(AttendanceType::CheckIn),
        Some("check_out") => Ok(AttendanceType::CheckOut),
        _ => Err(AppError::BadRequest("Invalid data.".into())),
    }
}

// multipart: `locationId`, `type` (check_in | check_out) e `image`
#[utoipa::path(
    post,
    path = "/api/attendance/kiosk",
    tag = "Attendance",
    responses(
        (status = 200, description = "Identificado, duplicado ou não reconhecido", body = KioskCheckInResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 503, description = "Serviço facial indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn kiosk_check_in(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = UploadForm::read(multipart).await?;

    let location_id = form
        .field("locationId")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::BadRequest("Invalid data.".into()))?;
    let kind = parse_kind(form.field("type"))?;
    let image = form
        .take_files("image")
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("No image provided.".into()))?;

    let response = app_state
        .attendance_service
        .kiosk_check_in(tenant.company_id, location_id, kind, image)
        .await?;
    Ok(Json(response))
}

// Registro manual pelo RH: sem deduplicação e sem métricas
#[utoipa::path(
    post,
    path = "/api/attendance/manual",
    tag = "Attendance",
    request_body = ManualCheckInPayload,
    responses(
        (status = 201, description = "Registro criado", body = AttendanceLog),
        (status = 404, description = "Funcionário ou unidade de outra empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn manual_check_in(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<ManualCheckInPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let log = app_state
        .attendance_service
        .manual_check_in(tenant.company_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

// Callback do pipeline de câmeras (sem sessão; protegido por `x-api-secret`)
#[utoipa::path(
    post,
    path = "/api/attendance/log",
    tag = "Attendance",
    request_body = AttendanceCallbackPayload,
    params(("x-api-secret" = Option<String>, Header, description = "Segredo interno, quando configurado")),
    responses(
        (status = 200, description = "Registrado ou duplicado", body = AttendanceCallbackResponse),
        (status = 400, description = "Campos obrigatórios ausentes"),
        (status = 401, description = "Segredo inválido"),
        (status = 404, description = "Funcionário inexistente ou inativo")
    )
)]
pub async fn external_callback(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AttendanceCallbackPayload>,
) -> Result<impl IntoResponse, AppError> {
    let provided = headers.get(API_SECRET_HEADER).and_then(|v| v.to_str().ok());
    check_api_secret(app_state.internal_api_secret.as_deref(), provided)?;

    let response = app_state.attendance_service.external_callback(&payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    tag = "Attendance",
    params(PageParams, AttendanceFilters),
    responses((status = 200, description = "Registros paginados", body = Page<AttendanceLogItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<AttendanceFilters>,
) -> Result<impl IntoResponse, AppError> {
    let logs = app_state
        .attendance_service
        .list_logs(tenant.company_id, &filters, page)
        .await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/api/attendance/recent",
    tag = "Attendance",
    params(RecentParams),
    responses((status = 200, description = "Últimos registros", body = Vec<RecentActivityItem>)),
    security(("api_jwt" = []))
)]
pub async fn recent_activity(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<RecentParams>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .attendance_service
        .recent(tenant.company_id, params.limit)
        .await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    tag = "Attendance",
    responses((status = 200, description = "Resumo do dia (UTC)", body = TodayStats)),
    security(("api_jwt" = []))
)]
pub async fn today_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.attendance_service.today(tenant.company_id).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_only_enforced_when_configured() {
        assert!(check_api_secret(None, None).is_ok());
        assert!(check_api_secret(None, Some("anything")).is_ok());
        assert!(check_api_secret(Some("s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(check_api_secret(Some("s3cret"), None), Err(AppError::ApiSecretMismatch)));
        assert!(matches!(check_api_secret(Some("s3cret"), Some("nope")), Err(AppError::ApiSecretMismatch)));
    }

    #[test]
    fn kiosk_type_must_be_known() {
        assert_eq!(parse_kind(Some("check_in")).unwrap(), AttendanceType::CheckIn);
        assert_eq!(parse_kind(Some("check_out")).unwrap(), AttendanceType::CheckOut);
        assert!(parse_kind(Some("lunch")).is_err());
        assert!(parse_kind(None).is_err());
    }
}
