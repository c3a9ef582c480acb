// src/handlers/leaves.rs
//
// Pedidos de afastamento, saldos e tipos de afastamento.

use axum::{
    extract::{Path, Query, State},
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
    middleware::{
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        employee::Employee,
        leave::{
            ApplyLeavePayload, BalanceParams, Leave, LeaveBalanceView, LeaveFilters, LeaveListItem, LeaveType,
            LeaveTypePayload, RejectLeavePayload,
        },
    },
};

// =============================================================================
//  PEDIDOS
// =============================================================================

// Escopo por papel: admin vê tudo, gerente vê a equipe, funcionário vê os próprios
#[utoipa::path(
    get,
    path = "/api/leaves",
    tag = "Leaves",
    params(PageParams, LeaveFilters),
    responses((status = 200, description = "Pedidos visíveis ao usuário", body = Page<LeaveListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_leaves(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<LeaveFilters>,
) -> Result<impl IntoResponse, AppError> {
    let leaves = app_state.leave_service.list(&tenant, &filters, page).await?;
    Ok(Json(leaves))
}

// Cadastro de funcionário vinculado ao usuário logado (ou null)
#[utoipa::path(
    get,
    path = "/api/leaves/me",
    tag = "Leaves",
    responses((status = 200, description = "Funcionário vinculado por e-mail (ou null)", body = Employee)),
    security(("api_jwt" = []))
)]
pub async fn my_employee(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.leave_service.my_employee(&tenant).await?;
    Ok(Json(employee))
}

#[utoipa::path(
    post,
    path = "/api/leaves",
    tag = "Leaves",
    request_body = ApplyLeavePayload,
    responses(
        (status = 201, description = "Pedido criado como pendente", body = Leave),
        (status = 400, description = "Período inválido"),
        (status = 422, description = "Saldo inexistente ou insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn apply_leave(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<ApplyLeavePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let leave = app_state.leave_service.apply(&tenant, &payload).await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{id}/approve",
    tag = "Leaves",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Aprovado e saldo debitado", body = Leave),
        (status = 403, description = "Usuário não pode decidir"),
        (status = 422, description = "Pedido não pendente ou saldo insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_leave(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let leave = app_state.leave_service.approve(&tenant, id).await?;
    Ok(Json(leave))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{id}/reject",
    tag = "Leaves",
    request_body = RejectLeavePayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Rejeitado", body = Leave),
        (status = 422, description = "Pedido não pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_leave(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectLeavePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let leave = app_state.leave_service.reject(&tenant, id, &payload.reason).await?;
    Ok(Json(leave))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{id}/cancel",
    tag = "Leaves",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Cancelado; dias devolvidos se estava aprovado", body = Leave),
        (status = 422, description = "Pedido já rejeitado ou cancelado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_leave(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let leave = app_state.leave_service.cancel(&tenant, id).await?;
    Ok(Json(leave))
}

#[utoipa::path(
    get,
    path = "/api/leaves/balances",
    tag = "Leaves",
    params(BalanceParams),
    responses((status = 200, description = "Saldos do ano", body = Vec<LeaveBalanceView>)),
    security(("api_jwt" = []))
)]
pub async fn list_balances(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<BalanceParams>,
) -> Result<impl IntoResponse, AppError> {
    let balances = app_state
        .leave_service
        .balances(&tenant, params.employee_id, params.year)
        .await?;
    Ok(Json(balances))
}

// =============================================================================
//  TIPOS DE AFASTAMENTO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/leave-types",
    tag = "Leave Types",
    responses((status = 200, description = "Tipos da empresa", body = Vec<LeaveType>)),
    security(("api_jwt" = []))
)]
pub async fn list_leave_types(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let types = app_state.leave_service.list_types(tenant.company_id).await?;
    Ok(Json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    tag = "Leave Types",
    request_body = LeaveTypePayload,
    responses((status = 201, description = "Tipo criado com saldos do ano corrente", body = LeaveType)),
    security(("api_jwt" = []))
)]
pub async fn create_leave_type(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<LeaveTypePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let leave_type = app_state.leave_service.create_type(tenant.company_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(leave_type)))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{id}",
    tag = "Leave Types",
    request_body = LeaveTypePayload,
    params(("id" = Uuid, Path, description = "ID do tipo")),
    responses((status = 200, description = "Tipo atualizado", body = LeaveType)),
    security(("api_jwt" = []))
)]
pub async fn update_leave_type(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveTypePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let leave_type = app_state
        .leave_service
        .update_type(tenant.company_id, id, &payload)
        .await?;
    Ok(Json(leave_type))
}

#[utoipa::path(
    delete,
    path = "/api/leave-types/{id}",
    tag = "Leave Types",
    params(("id" = Uuid, Path, description = "ID do tipo")),
    responses(
        (status = 204, description = "Tipo e saldos removidos"),
        (status = 409, description = "Existem pedidos para este tipo")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_leave_type(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.leave_service.delete_type(tenant.company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
