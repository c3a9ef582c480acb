// src/services/leave_service.rs
//
// Pedidos de afastamento (solicitar / aprovar / rejeitar / cancelar), saldos e tipos.
// Toda mutação de saldo acontece na mesma transação da mudança de status.
// A persistência fica atrás de `LeaveStore` para os fluxos rodarem com dublê em teste.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        dates::{current_year, inclusive_days},
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::{leave_repo::NewLeave, EmployeeRepository, LeaveRepository, NotificationRepository, UserRepository},
    middleware::tenancy::TenantContext,
    models::{
        auth::Role,
        employee::Employee,
        leave::{
            ApplyLeavePayload, Leave, LeaveBalance, LeaveBalanceView, LeaveFilters, LeaveListItem, LeaveStatus,
            LeaveType, LeaveTypePayload,
        },
        notification::{NewNotification, NotificationType},
    },
    services::leave_workflow::{can_decide, transition, LeaveAction, LeaveScope, TransitionError},
};

// =============================================================================
//  REGRAS DO SALDO (puras)
// =============================================================================

/// Dias do pedido (inclusivo). Fim antes do início é recusado.
pub fn requested_days(start: NaiveDate, end: NaiveDate) -> Result<i32, AppError> {
    let days = inclusive_days(start, end);
    if days < 1 {
        return Err(AppError::BadRequest("End date must be on or after start date.".into()));
    }
    i32::try_from(days).map_err(|_| AppError::BadRequest("Leave period is too long.".into()))
}

/// Checagem feita ao solicitar; a aprovação refaz a checagem de forma atômica no banco.
pub fn check_balance(balance: Option<&LeaveBalance>, days: i32) -> Result<(), AppError> {
    let balance = balance.ok_or_else(|| AppError::BusinessRule("No leave balance found for this type.".into()))?;
    if balance.remaining_days < days {
        return Err(insufficient(balance.remaining_days));
    }
    Ok(())
}

fn insufficient(remaining: i32) -> AppError {
    AppError::BusinessRule(format!(
        "Insufficient balance. You have {} day(s) remaining.",
        remaining
    ))
}

/// Espelho do estorno feito em SQL: `used` nunca negativo, `remaining = total - used`.
pub fn credited(total: i32, used: i32, days: i32) -> (i32, i32) {
    let used = (used - days).max(0);
    (used, total - used)
}

fn transition_error(e: TransitionError) -> AppError {
    tracing::debug!("Transição inválida {:?} -> {:?}", e.from, e.action);
    AppError::BusinessRule(e.message().to_string())
}

// =============================================================================
//  PERSISTÊNCIA (trait para permitir dublês em teste)
// =============================================================================

/// Leituras fora de transação e abertura de unidades de trabalho.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Abre uma transação. Descartar a unidade sem `commit` desfaz tudo.
    async fn begin(&self) -> Result<Box<dyn LeaveUnit>, AppError>;

    /// Cadastro com o mesmo e-mail da conta, qualquer status.
    async fn employee_by_email(&self, company_id: Uuid, email: &str) -> Result<Option<Employee>, AppError>;

    async fn list_leaves(
        &self,
        company_id: Uuid,
        scope: (Option<Uuid>, Option<Uuid>),
        filters: &LeaveFilters,
        page: PageParams,
    ) -> Result<(Vec<LeaveListItem>, i64), AppError>;

    async fn list_balances(&self, company_id: Uuid, employee_id: Uuid, year: i32)
        -> Result<Vec<LeaveBalanceView>, AppError>;

    async fn list_types(&self, company_id: Uuid) -> Result<Vec<LeaveType>, AppError>;

    /// `is_active = None` mantém o valor gravado.
    async fn update_type(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
        days_per_year: i32,
        is_active: Option<bool>,
    ) -> Result<Option<LeaveType>, AppError>;
}

/// Operações dentro de uma transação.
#[async_trait]
pub trait LeaveUnit: Send {
    async fn employee(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>, AppError>;

    async fn department_manager(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Uuid>, AppError>;

    async fn leave_type(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<LeaveType>, AppError>;

    async fn balance(&mut self, employee_id: Uuid, leave_type_id: Uuid, year: i32)
        -> Result<Option<LeaveBalance>, AppError>;

    async fn insert_leave(&mut self, new: &NewLeave<'_>) -> Result<Leave, AppError>;

    /// Pedido da empresa, travado até o fim da unidade.
    async fn lock_leave(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Leave>, AppError>;

    /// `None` = linha ausente ou saldo insuficiente; nada é alterado.
    async fn debit(&mut self, employee_id: Uuid, leave_type_id: Uuid, year: i32, days: i32)
        -> Result<Option<LeaveBalance>, AppError>;

    async fn credit(&mut self, employee_id: Uuid, leave_type_id: Uuid, year: i32, days: i32)
        -> Result<Option<LeaveBalance>, AppError>;

    async fn set_status(
        &mut self,
        id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
        rejection_reason: Option<&str>,
    ) -> Result<Leave, AppError>;

    async fn admin_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn user_id_by_email(&mut self, company_id: Uuid, email: &str) -> Result<Option<Uuid>, AppError>;

    async fn notify(&mut self, company_id: Uuid, notification: &NewNotification) -> Result<(), AppError>;

    async fn create_type(&mut self, company_id: Uuid, name: &str, days_per_year: i32, is_active: bool)
        -> Result<LeaveType, AppError>;

    async fn active_employee_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    /// Saldo cheio para cada funcionário; linhas existentes são mantidas.
    async fn backfill(&mut self, leave_type_id: Uuid, employee_ids: &[Uuid], days: i32, year: i32)
        -> Result<u64, AppError>;

    async fn type_has_leaves(&mut self, leave_type_id: Uuid) -> Result<bool, AppError>;

    async fn delete_balances_for_type(&mut self, leave_type_id: Uuid) -> Result<u64, AppError>;

    async fn delete_type(&mut self, company_id: Uuid, id: Uuid) -> Result<u64, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgLeaveStore {
    pool: PgPool,
    leave_repo: LeaveRepository,
    employee_repo: EmployeeRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
}

impl PgLeaveStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            leave_repo: LeaveRepository::new(pool.clone()),
            employee_repo: EmployeeRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool.clone()),
            notification_repo: NotificationRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl LeaveStore for PgLeaveStore {
    async fn begin(&self) -> Result<Box<dyn LeaveUnit>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLeaveUnit {
            tx,
            leave_repo: self.leave_repo.clone(),
            employee_repo: self.employee_repo.clone(),
            user_repo: self.user_repo.clone(),
            notification_repo: self.notification_repo.clone(),
        }))
    }

    async fn employee_by_email(&self, company_id: Uuid, email: &str) -> Result<Option<Employee>, AppError> {
        self.employee_repo.find_by_email(company_id, email).await
    }

    async fn list_leaves(
        &self,
        company_id: Uuid,
        scope: (Option<Uuid>, Option<Uuid>),
        filters: &LeaveFilters,
        page: PageParams,
    ) -> Result<(Vec<LeaveListItem>, i64), AppError> {
        self.leave_repo.list_leaves(company_id, scope, filters, page).await
    }

    async fn list_balances(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        year: i32,
    ) -> Result<Vec<LeaveBalanceView>, AppError> {
        self.leave_repo.list_balances(company_id, employee_id, year).await
    }

    async fn list_types(&self, company_id: Uuid) -> Result<Vec<LeaveType>, AppError> {
        self.leave_repo.list_types(company_id).await
    }

    async fn update_type(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: &str,
        days_per_year: i32,
        is_active: Option<bool>,
    ) -> Result<Option<LeaveType>, AppError> {
        self.leave_repo
            .update_type(company_id, id, name, days_per_year, is_active)
            .await
    }
}

struct PgLeaveUnit {
    tx: Transaction<'static, Postgres>,
    leave_repo: LeaveRepository,
    employee_repo: EmployeeRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
}

#[async_trait]
impl LeaveUnit for PgLeaveUnit {
    async fn employee(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
        self.employee_repo.find(&mut *self.tx, company_id, employee_id).await
    }

    async fn department_manager(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Uuid>, AppError> {
        self.employee_repo
            .department_manager(&mut *self.tx, company_id, employee_id)
            .await
    }

    async fn leave_type(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<LeaveType>, AppError> {
        self.leave_repo.find_type(&mut *self.tx, company_id, id).await
    }

    async fn balance(
        &mut self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        self.leave_repo
            .find_balance(&mut *self.tx, employee_id, leave_type_id, year)
            .await
    }

    async fn insert_leave(&mut self, new: &NewLeave<'_>) -> Result<Leave, AppError> {
        self.leave_repo.insert_leave(&mut *self.tx, new).await
    }

    async fn lock_leave(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Leave>, AppError> {
        self.leave_repo
            .find_leave_for_update(&mut *self.tx, company_id, id)
            .await
    }

    async fn debit(
        &mut self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        days: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        self.leave_repo
            .debit_balance(&mut *self.tx, employee_id, leave_type_id, year, days)
            .await
    }

    async fn credit(
        &mut self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        days: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        self.leave_repo
            .credit_balance(&mut *self.tx, employee_id, leave_type_id, year, days)
            .await
    }

    async fn set_status(
        &mut self,
        id: Uuid,
        status: LeaveStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
        rejection_reason: Option<&str>,
    ) -> Result<Leave, AppError> {
        self.leave_repo
            .set_status(&mut *self.tx, id, status, decided_by, decided_at, rejection_reason)
            .await
    }

    async fn admin_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.user_repo.list_admin_ids(&mut *self.tx, company_id).await
    }

    async fn user_id_by_email(&mut self, company_id: Uuid, email: &str) -> Result<Option<Uuid>, AppError> {
        self.user_repo
            .find_id_in_company_by_email(&mut *self.tx, company_id, email)
            .await
    }

    async fn notify(&mut self, company_id: Uuid, notification: &NewNotification) -> Result<(), AppError> {
        self.notification_repo.insert(&mut *self.tx, company_id, notification).await
    }

    async fn create_type(
        &mut self,
        company_id: Uuid,
        name: &str,
        days_per_year: i32,
        is_active: bool,
    ) -> Result<LeaveType, AppError> {
        self.leave_repo
            .create_type(&mut *self.tx, company_id, name, days_per_year, is_active)
            .await
    }

    async fn active_employee_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.employee_repo.active_ids(&mut *self.tx, company_id).await
    }

    async fn backfill(
        &mut self,
        leave_type_id: Uuid,
        employee_ids: &[Uuid],
        days: i32,
        year: i32,
    ) -> Result<u64, AppError> {
        self.leave_repo
            .backfill_balances(&mut *self.tx, leave_type_id, employee_ids, days, year)
            .await
    }

    async fn type_has_leaves(&mut self, leave_type_id: Uuid) -> Result<bool, AppError> {
        self.leave_repo.type_has_leaves(&mut *self.tx, leave_type_id).await
    }

    async fn delete_balances_for_type(&mut self, leave_type_id: Uuid) -> Result<u64, AppError> {
        self.leave_repo
            .delete_balances_for_type(&mut *self.tx, leave_type_id)
            .await
    }

    async fn delete_type(&mut self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        self.leave_repo.delete_type(&mut *self.tx, company_id, id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let unit = *self;
        unit.tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    // =============================================================================
    //  ESCOPO
    // =============================================================================

    /// Cadastro de funcionário ativo vinculado ao usuário (mesmo e-mail).
    pub async fn my_employee(&self, ctx: &TenantContext) -> Result<Option<Employee>, AppError> {
        let employee = self.store.employee_by_email(ctx.company_id, &ctx.email).await?;
        Ok(employee.filter(|e| e.status.is_active()))
    }

    async fn scope_for(&self, ctx: &TenantContext) -> Result<LeaveScope, AppError> {
        let linked = match ctx.role {
            Role::Employee => self.my_employee(ctx).await?.map(|e| e.id),
            _ => None,
        };
        Ok(LeaveScope::for_user(ctx.role, ctx.user_id, linked))
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filters: &LeaveFilters,
        page: PageParams,
    ) -> Result<Page<LeaveListItem>, AppError> {
        let scope = self.scope_for(ctx).await?;
        if scope == LeaveScope::Nothing {
            return Ok(Page::new(Vec::new(), 0, page));
        }

        let (items, total) = self
            .store
            .list_leaves(ctx.company_id, scope.sql_filters(), filters, page)
            .await?;
        Ok(Page::new(items, total, page))
    }

    // =============================================================================
    //  FLUXO DO PEDIDO
    // =============================================================================

    pub async fn apply(&self, ctx: &TenantContext, payload: &ApplyLeavePayload) -> Result<Leave, AppError> {
        let days = requested_days(payload.start_date, payload.end_date)?;
        let scope = self.scope_for(ctx).await?;

        let mut unit = self.store.begin().await?;

        let employee = unit
            .employee(ctx.company_id, payload.employee_id)
            .await?
            .ok_or(AppError::NotFound("Employee"))?;
        let leave_type = unit
            .leave_type(ctx.company_id, payload.leave_type_id)
            .await?
            .ok_or(AppError::NotFound("Leave type"))?;

        let manager = unit.department_manager(ctx.company_id, employee.id).await?;
        if !scope.contains(employee.id, manager) {
            return Err(AppError::Forbidden("You cannot apply for leave on behalf of this employee.".into()));
        }

        let year = current_year(Utc::now());
        let balance = unit.balance(employee.id, leave_type.id, year).await?;
        check_balance(balance.as_ref(), days)?;

        let leave = unit
            .insert_leave(&NewLeave {
                company_id: ctx.company_id,
                employee_id: employee.id,
                leave_type_id: leave_type.id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                days_count: days,
                reason: payload.reason.as_deref().filter(|r| !r.trim().is_empty()),
            })
            .await?;

        // Administradores + gerente do departamento, sem repetição.
        let mut recipients = unit.admin_ids(ctx.company_id).await?;
        if let Some(manager) = manager {
            if !recipients.contains(&manager) {
                recipients.push(manager);
            }
        }

        let message = format!(
            "{} has applied for {} day(s) of {}.",
            employee.full_name(),
            days,
            leave_type.name
        );
        for user_id in recipients {
            let notification = leave_notification(
                user_id,
                NotificationType::LeaveRequested,
                "Leave Request",
                &message,
                leave.id,
            );
            unit.notify(ctx.company_id, &notification).await?;
        }

        unit.commit().await?;
        tracing::info!("📝 Pedido de afastamento {} criado ({} dias)", leave.id, days);
        Ok(leave)
    }

    /// Aprovação debita o saldo do ano corrente; saldo ausente ou curto aborta tudo.
    pub async fn approve(&self, ctx: &TenantContext, leave_id: Uuid) -> Result<Leave, AppError> {
        let mut unit = self.store.begin().await?;
        let leave = load_for_decision(unit.as_mut(), ctx, leave_id).await?;

        let next = transition(leave.status, LeaveAction::Approve)
            .map_err(transition_error)?;

        let year = current_year(Utc::now());
        let debited = unit
            .debit(leave.employee_id, leave.leave_type_id, year, leave.days_count)
            .await?;
        if debited.is_none() {
            let balance = unit.balance(leave.employee_id, leave.leave_type_id, year).await?;
            return Err(match balance {
                None => AppError::BusinessRule("No leave balance found for this type.".into()),
                Some(b) => insufficient(b.remaining_days),
            });
        }

        let updated = unit
            .set_status(leave.id, next, Some(ctx.user_id), Some(Utc::now()), None)
            .await?;

        notify_employee(
            unit.as_mut(),
            ctx.company_id,
            leave.employee_id,
            NotificationType::LeaveApproved,
            "Leave Approved",
            "Your leave request has been approved.",
            leave.id,
        )
        .await?;

        unit.commit().await?;
        tracing::info!("✅ Afastamento {} aprovado por {}", leave.id, ctx.user_id);
        Ok(updated)
    }

    pub async fn reject(&self, ctx: &TenantContext, leave_id: Uuid, reason: &str) -> Result<Leave, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("Rejection reason is required.".into()));
        }

        let mut unit = self.store.begin().await?;
        let leave = load_for_decision(unit.as_mut(), ctx, leave_id).await?;

        let next = transition(leave.status, LeaveAction::Reject)
            .map_err(transition_error)?;

        let updated = unit
            .set_status(leave.id, next, Some(ctx.user_id), None, Some(reason))
            .await?;

        notify_employee(
            unit.as_mut(),
            ctx.company_id,
            leave.employee_id,
            NotificationType::LeaveRejected,
            "Leave Rejected",
            &format!("Your leave request was rejected. Reason: {}", reason),
            leave.id,
        )
        .await?;

        unit.commit().await?;
        tracing::info!("❌ Afastamento {} rejeitado por {}", leave.id, ctx.user_id);
        Ok(updated)
    }

    /// Cancelar um pedido aprovado devolve os dias ao saldo.
    pub async fn cancel(&self, ctx: &TenantContext, leave_id: Uuid) -> Result<Leave, AppError> {
        let scope = self.scope_for(ctx).await?;
        let mut unit = self.store.begin().await?;

        let leave = unit
            .lock_leave(ctx.company_id, leave_id)
            .await?
            .ok_or(AppError::NotFound("Leave request"))?;

        let manager = unit.department_manager(ctx.company_id, leave.employee_id).await?;
        if !scope.contains(leave.employee_id, manager) {
            return Err(AppError::NotFound("Leave request"));
        }

        let next = transition(leave.status, LeaveAction::Cancel)
            .map_err(transition_error)?;

        if leave.status == LeaveStatus::Approved {
            let year = current_year(Utc::now());
            let credited = unit
                .credit(leave.employee_id, leave.leave_type_id, year, leave.days_count)
                .await?;
            if credited.is_none() {
                tracing::warn!("⚠️ Saldo de {} não encontrado para estorno do pedido {}", year, leave.id);
            }
        }

        let updated = unit.set_status(leave.id, next, None, None, None).await?;

        unit.commit().await?;
        tracing::info!("↩️ Afastamento {} cancelado", leave.id);
        Ok(updated)
    }

    // =============================================================================
    //  SALDOS
    // =============================================================================

    pub async fn balances(
        &self,
        ctx: &TenantContext,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<LeaveBalanceView>, AppError> {
        let scope = self.scope_for(ctx).await?;

        // Só leitura: a unidade é descartada sem commit.
        let mut unit = self.store.begin().await?;
        unit.employee(ctx.company_id, employee_id)
            .await?
            .ok_or(AppError::NotFound("Employee"))?;
        let manager = unit.department_manager(ctx.company_id, employee_id).await?;
        drop(unit);

        if !scope.contains(employee_id, manager) {
            return Err(AppError::NotFound("Employee"));
        }

        let year = year.unwrap_or_else(|| current_year(Utc::now()));
        self.store.list_balances(ctx.company_id, employee_id, year).await
    }

    // =============================================================================
    //  TIPOS DE AFASTAMENTO
    // =============================================================================

    pub async fn list_types(&self, company_id: Uuid) -> Result<Vec<LeaveType>, AppError> {
        self.store.list_types(company_id).await
    }

    /// Todo tipo novo, ativo ou não, nasce com saldo cheio do ano corrente
    /// para os funcionários ativos.
    pub async fn create_type(&self, company_id: Uuid, payload: &LeaveTypePayload) -> Result<LeaveType, AppError> {
        let mut unit = self.store.begin().await?;

        let leave_type = unit
            .create_type(
                company_id,
                payload.name.trim(),
                payload.days_per_year,
                payload.is_active.unwrap_or(true),
            )
            .await?;

        let employee_ids = unit.active_employee_ids(company_id).await?;
        let created = unit
            .backfill(
                leave_type.id,
                &employee_ids,
                leave_type.days_per_year,
                current_year(Utc::now()),
            )
            .await?;

        unit.commit().await?;
        tracing::info!("📅 Tipo '{}' criado com {} saldos", leave_type.name, created);
        Ok(leave_type)
    }

    /// `isActive` omitido mantém o status atual do tipo.
    pub async fn update_type(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &LeaveTypePayload,
    ) -> Result<LeaveType, AppError> {
        self.store
            .update_type(company_id, id, payload.name.trim(), payload.days_per_year, payload.is_active)
            .await?
            .ok_or(AppError::NotFound("Leave type"))
    }

    /// Tipos com pedidos não podem ser excluídos, apenas desativados.
    pub async fn delete_type(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut unit = self.store.begin().await?;

        unit.leave_type(company_id, id)
            .await?
            .ok_or(AppError::NotFound("Leave type"))?;

        if unit.type_has_leaves(id).await? {
            return Err(AppError::Conflict(
                "Cannot delete: leave records exist for this type. Deactivate it instead.".into(),
            ));
        }

        unit.delete_balances_for_type(id).await?;
        unit.delete_type(company_id, id).await?;

        unit.commit().await?;
        Ok(())
    }
}

/// Trava o pedido e confere se o usuário pode decidir sobre ele.
async fn load_for_decision(unit: &mut dyn LeaveUnit, ctx: &TenantContext, leave_id: Uuid) -> Result<Leave, AppError> {
    let leave = unit
        .lock_leave(ctx.company_id, leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;

    let manager = unit.department_manager(ctx.company_id, leave.employee_id).await?;
    if !can_decide(ctx.role, ctx.user_id, manager) {
        return Err(AppError::Forbidden("You are not allowed to decide on this leave request.".into()));
    }
    Ok(leave)
}

fn leave_notification(
    user_id: Uuid,
    kind: NotificationType,
    title: &str,
    message: &str,
    leave_id: Uuid,
) -> NewNotification {
    NewNotification {
        user_id,
        kind,
        title: title.to_string(),
        message: message.to_string(),
        data: Some(json!({ "leaveId": leave_id })),
    }
}

/// Notifica a conta do funcionário (mesmo e-mail); sem conta, nada acontece.
async fn notify_employee(
    unit: &mut dyn LeaveUnit,
    company_id: Uuid,
    employee_id: Uuid,
    kind: NotificationType,
    title: &str,
    message: &str,
    leave_id: Uuid,
) -> Result<(), AppError> {
    let Some(employee) = unit.employee(company_id, employee_id).await? else {
        return Ok(());
    };
    let Some(email) = employee.email.as_deref() else {
        return Ok(());
    };
    let Some(user_id) = unit.user_id_by_email(company_id, email).await? else {
        return Ok(());
    };
    let notification = leave_notification(user_id, kind, title, message, leave_id);
    unit.notify(company_id, &notification).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeStatus;
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn balance(total: i32, used: i32) -> LeaveBalance {
        LeaveBalance {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            leave_type_id: Uuid::new_v4(),
            total_days: total,
            used_days: used,
            remaining_days: total - used,
            year: 2026,
        }
    }

    #[test]
    fn requested_days_are_inclusive() {
        assert_eq!(requested_days(d(2026, 3, 2), d(2026, 3, 6)).unwrap(), 5);
        assert_eq!(requested_days(d(2026, 3, 2), d(2026, 3, 2)).unwrap(), 1);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = requested_days(d(2026, 3, 6), d(2026, 3, 2)).unwrap_err();
        assert_eq!(err.public_message(), "End date must be on or after start date.");
    }

    #[test]
    fn missing_balance_blocks_application() {
        let err = check_balance(None, 1).unwrap_err();
        assert_eq!(err.public_message(), "No leave balance found for this type.");
    }

    #[test]
    fn short_balance_reports_remaining_days() {
        let err = check_balance(Some(&balance(12, 10)), 3).unwrap_err();
        assert_eq!(err.public_message(), "Insufficient balance. You have 2 day(s) remaining.");
        assert!(check_balance(Some(&balance(12, 10)), 2).is_ok());
    }

    #[test]
    fn credit_keeps_invariant_and_never_goes_negative() {
        assert_eq!(credited(12, 5, 3), (2, 10));
        assert_eq!(credited(12, 2, 5), (0, 12));
        for used in 0..=12 {
            for days in 1..=12 {
                let (u, r) = credited(12, used, days);
                assert!(u >= 0);
                assert_eq!(r, 12 - u);
            }
        }
    }

    // --- Dublês ---

    #[derive(Clone, Default)]
    struct World {
        employees: Vec<Employee>,
        // (funcionário, gerente do departamento)
        managers: Vec<(Uuid, Uuid)>,
        // (empresa, usuário, e-mail, administrador)
        users: Vec<(Uuid, Uuid, String, bool)>,
        types: Vec<LeaveType>,
        balances: Vec<LeaveBalance>,
        leaves: Vec<Leave>,
        notifications: Vec<(Uuid, NotificationType, String)>,
    }

    #[derive(Default)]
    struct MemoryStore {
        world: Arc<Mutex<World>>,
    }

    impl MemoryStore {
        fn snapshot(&self) -> World {
            self.world.lock().unwrap().clone()
        }

        fn edit(&self, f: impl FnOnce(&mut World)) {
            f(&mut self.world.lock().unwrap());
        }
    }

    /// Trabalha sobre uma cópia; só o `commit` publica as mudanças.
    struct MemoryUnit {
        committed: Arc<Mutex<World>>,
        work: World,
    }

    #[async_trait]
    impl LeaveStore for MemoryStore {
        async fn begin(&self) -> Result<Box<dyn LeaveUnit>, AppError> {
            Ok(Box::new(MemoryUnit { committed: self.world.clone(), work: self.snapshot() }))
        }

        async fn employee_by_email(&self, company_id: Uuid, email: &str) -> Result<Option<Employee>, AppError> {
            let world = self.world.lock().unwrap();
            Ok(world
                .employees
                .iter()
                .find(|e| e.company_id == company_id && e.email.as_deref() == Some(email))
                .cloned())
        }

        async fn list_leaves(
            &self,
            _company_id: Uuid,
            _scope: (Option<Uuid>, Option<Uuid>),
            _filters: &LeaveFilters,
            _page: PageParams,
        ) -> Result<(Vec<LeaveListItem>, i64), AppError> {
            unreachable!()
        }

        async fn list_balances(
            &self,
            company_id: Uuid,
            employee_id: Uuid,
            year: i32,
        ) -> Result<Vec<LeaveBalanceView>, AppError> {
            let world = self.world.lock().unwrap();
            Ok(world
                .balances
                .iter()
                .filter(|b| b.employee_id == employee_id && b.year == year)
                .filter_map(|b| {
                    let t = world.types.iter().find(|t| t.id == b.leave_type_id && t.company_id == company_id)?;
                    Some(LeaveBalanceView {
                        id: b.id,
                        leave_type_id: t.id,
                        leave_type_name: t.name.clone(),
                        total_days: b.total_days,
                        used_days: b.used_days,
                        remaining_days: b.remaining_days,
                        year: b.year,
                    })
                })
                .collect())
        }

        async fn list_types(&self, company_id: Uuid) -> Result<Vec<LeaveType>, AppError> {
            let world = self.world.lock().unwrap();
            Ok(world.types.iter().filter(|t| t.company_id == company_id).cloned().collect())
        }

        async fn update_type(
            &self,
            company_id: Uuid,
            id: Uuid,
            name: &str,
            days_per_year: i32,
            is_active: Option<bool>,
        ) -> Result<Option<LeaveType>, AppError> {
            let mut world = self.world.lock().unwrap();
            let Some(t) = world.types.iter_mut().find(|t| t.id == id && t.company_id == company_id) else {
                return Ok(None);
            };
            t.name = name.to_string();
            t.days_per_year = days_per_year;
            if let Some(active) = is_active {
                t.is_active = active;
            }
            Ok(Some(t.clone()))
        }
    }

    #[async_trait]
    impl LeaveUnit for MemoryUnit {
        async fn employee(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
            Ok(self
                .work
                .employees
                .iter()
                .find(|e| e.id == employee_id && e.company_id == company_id)
                .cloned())
        }

        async fn department_manager(&mut self, company_id: Uuid, employee_id: Uuid) -> Result<Option<Uuid>, AppError> {
            if !self.work.employees.iter().any(|e| e.id == employee_id && e.company_id == company_id) {
                return Ok(None);
            }
            Ok(self.work.managers.iter().find(|(e, _)| *e == employee_id).map(|(_, m)| *m))
        }

        async fn leave_type(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<LeaveType>, AppError> {
            Ok(self.work.types.iter().find(|t| t.id == id && t.company_id == company_id).cloned())
        }

        async fn balance(
            &mut self,
            employee_id: Uuid,
            leave_type_id: Uuid,
            year: i32,
        ) -> Result<Option<LeaveBalance>, AppError> {
            Ok(self
                .work
                .balances
                .iter()
                .find(|b| b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year)
                .cloned())
        }

        async fn insert_leave(&mut self, new: &NewLeave<'_>) -> Result<Leave, AppError> {
            let mut leave = leave_row(new.company_id, new.employee_id, new.leave_type_id, new.days_count);
            leave.start_date = new.start_date;
            leave.end_date = new.end_date;
            leave.reason = new.reason.map(str::to_string);
            self.work.leaves.push(leave.clone());
            Ok(leave)
        }

        async fn lock_leave(&mut self, company_id: Uuid, id: Uuid) -> Result<Option<Leave>, AppError> {
            Ok(self.work.leaves.iter().find(|l| l.id == id && l.company_id == company_id).cloned())
        }

        async fn debit(
            &mut self,
            employee_id: Uuid,
            leave_type_id: Uuid,
            year: i32,
            days: i32,
        ) -> Result<Option<LeaveBalance>, AppError> {
            let row = self.work.balances.iter_mut().find(|b| {
                b.employee_id == employee_id
                    && b.leave_type_id == leave_type_id
                    && b.year == year
                    && b.remaining_days >= days
            });
            Ok(row.map(|b| {
                b.used_days += days;
                b.remaining_days -= days;
                b.clone()
            }))
        }

        async fn credit(
            &mut self,
            employee_id: Uuid,
            leave_type_id: Uuid,
            year: i32,
            days: i32,
        ) -> Result<Option<LeaveBalance>, AppError> {
            let row = self
                .work
                .balances
                .iter_mut()
                .find(|b| b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year);
            Ok(row.map(|b| {
                let (used, remaining) = credited(b.total_days, b.used_days, days);
                b.used_days = used;
                b.remaining_days = remaining;
                b.clone()
            }))
        }

        async fn set_status(
            &mut self,
            id: Uuid,
            status: LeaveStatus,
            decided_by: Option<Uuid>,
            decided_at: Option<DateTime<Utc>>,
            rejection_reason: Option<&str>,
        ) -> Result<Leave, AppError> {
            let leave = self
                .work
                .leaves
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(AppError::NotFound("Leave request"))?;
            leave.status = status;
            leave.approved_by = decided_by.or(leave.approved_by);
            leave.approved_at = decided_at.or(leave.approved_at);
            if let Some(reason) = rejection_reason {
                leave.rejection_reason = Some(reason.to_string());
            }
            Ok(leave.clone())
        }

        async fn admin_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError> {
            Ok(self
                .work
                .users
                .iter()
                .filter(|(c, _, _, admin)| *c == company_id && *admin)
                .map(|(_, u, _, _)| *u)
                .collect())
        }

        async fn user_id_by_email(&mut self, company_id: Uuid, email: &str) -> Result<Option<Uuid>, AppError> {
            Ok(self
                .work
                .users
                .iter()
                .find(|(c, _, e, _)| *c == company_id && e == email)
                .map(|(_, u, _, _)| *u))
        }

        async fn notify(&mut self, _company_id: Uuid, notification: &NewNotification) -> Result<(), AppError> {
            self.work
                .notifications
                .push((notification.user_id, notification.kind, notification.message.clone()));
            Ok(())
        }

        async fn create_type(
            &mut self,
            company_id: Uuid,
            name: &str,
            days_per_year: i32,
            is_active: bool,
        ) -> Result<LeaveType, AppError> {
            let leave_type = type_row(company_id, name, days_per_year, is_active);
            self.work.types.push(leave_type.clone());
            Ok(leave_type)
        }

        async fn active_employee_ids(&mut self, company_id: Uuid) -> Result<Vec<Uuid>, AppError> {
            Ok(self
                .work
                .employees
                .iter()
                .filter(|e| e.company_id == company_id && e.status.is_active())
                .map(|e| e.id)
                .collect())
        }

        async fn backfill(
            &mut self,
            leave_type_id: Uuid,
            employee_ids: &[Uuid],
            days: i32,
            year: i32,
        ) -> Result<u64, AppError> {
            let mut created = 0;
            for employee_id in employee_ids {
                let exists = self.work.balances.iter().any(|b| {
                    b.employee_id == *employee_id && b.leave_type_id == leave_type_id && b.year == year
                });
                if !exists {
                    let mut row = balance(days, 0);
                    row.employee_id = *employee_id;
                    row.leave_type_id = leave_type_id;
                    row.year = year;
                    self.work.balances.push(row);
                    created += 1;
                }
            }
            Ok(created)
        }

        async fn type_has_leaves(&mut self, leave_type_id: Uuid) -> Result<bool, AppError> {
            Ok(self.work.leaves.iter().any(|l| l.leave_type_id == leave_type_id))
        }

        async fn delete_balances_for_type(&mut self, leave_type_id: Uuid) -> Result<u64, AppError> {
            let before = self.work.balances.len();
            self.work.balances.retain(|b| b.leave_type_id != leave_type_id);
            Ok((before - self.work.balances.len()) as u64)
        }

        async fn delete_type(&mut self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
            let before = self.work.types.len();
            self.work.types.retain(|t| !(t.id == id && t.company_id == company_id));
            Ok((before - self.work.types.len()) as u64)
        }

        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            let unit = *self;
            *unit.committed.lock().unwrap() = unit.work;
            Ok(())
        }
    }

    // --- Cenário ---

    fn employee_row(company_id: Uuid, first_name: &str, status: EmployeeStatus) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_id,
            location_id: Uuid::new_v4(),
            department_id: None,
            shift_id: None,
            employee_code: format!("EMP-{}", first_name.to_uppercase()),
            first_name: first_name.to_string(),
            last_name: "Souza".into(),
            email: Some(format!("{}@acme.test", first_name.to_lowercase())),
            phone: None,
            position: None,
            face_enrolled: false,
            face_enrolled_at: None,
            face_image_count: 0,
            status,
            joined_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn type_row(company_id: Uuid, name: &str, days_per_year: i32, is_active: bool) -> LeaveType {
        LeaveType {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            days_per_year,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn leave_row(company_id: Uuid, employee_id: Uuid, leave_type_id: Uuid, days: i32) -> Leave {
        Leave {
            id: Uuid::new_v4(),
            company_id,
            employee_id,
            leave_type_id,
            start_date: d(2026, 3, 2),
            end_date: d(2026, 3, 2) + chrono::Duration::days(i64::from(days) - 1),
            days_count: days,
            reason: None,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ctx(company_id: Uuid, user_id: Uuid, role: Role, email: &str) -> TenantContext {
        TenantContext { company_id, user_id, role, email: email.to_string() }
    }

    /// Uma empresa com a Ana (saldo 12/2/10), gerente, admin e um pedido pendente de 5 dias.
    struct Company {
        id: Uuid,
        ana: Employee,
        leave_type: LeaveType,
        leave_id: Uuid,
        admin: TenantContext,
        manager: TenantContext,
        ana_user: Uuid,
    }

    fn seed_company(store: &MemoryStore) -> Company {
        let id = Uuid::new_v4();
        let ana = employee_row(id, "Ana", EmployeeStatus::Active);
        let leave_type = type_row(id, "Annual", 12, true);
        let leave = leave_row(id, ana.id, leave_type.id, 5);
        let admin = ctx(id, Uuid::new_v4(), Role::HrAdmin, "rh@acme.test");
        let manager = ctx(id, Uuid::new_v4(), Role::Manager, "gerente@acme.test");
        let ana_user = Uuid::new_v4();

        let mut row = balance(12, 2);
        row.employee_id = ana.id;
        row.leave_type_id = leave_type.id;
        row.year = current_year(Utc::now());

        store.edit(|w| {
            w.employees.push(ana.clone());
            w.managers.push((ana.id, manager.user_id));
            w.users.push((id, admin.user_id, admin.email.clone(), true));
            w.users.push((id, manager.user_id, manager.email.clone(), false));
            w.users.push((id, ana_user, "ana@acme.test".into(), false));
            w.types.push(leave_type.clone());
            w.balances.push(row);
            w.leaves.push(leave.clone());
        });

        Company { id, ana, leave_type, leave_id: leave.id, admin, manager, ana_user }
    }

    fn service(store: &Arc<MemoryStore>) -> LeaveService {
        LeaveService::new(store.clone())
    }

    fn balance_of(world: &World, employee_id: Uuid, leave_type_id: Uuid) -> (i32, i32, i32) {
        let b = world
            .balances
            .iter()
            .find(|b| b.employee_id == employee_id && b.leave_type_id == leave_type_id)
            .unwrap();
        (b.total_days, b.used_days, b.remaining_days)
    }

    fn status_of(world: &World, leave_id: Uuid) -> LeaveStatus {
        world.leaves.iter().find(|l| l.id == leave_id).unwrap().status
    }

    fn type_payload(name: &str, days: i32, is_active: Option<bool>) -> LeaveTypePayload {
        LeaveTypePayload { name: name.to_string(), days_per_year: days, is_active }
    }

    // --- Fluxo do pedido ---

    #[tokio::test]
    async fn approval_debits_and_cancel_restores_exactly() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        let svc = service(&store);

        let approved = svc.approve(&acme.manager, acme.leave_id).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by, Some(acme.manager.user_id));

        let world = store.snapshot();
        assert_eq!(balance_of(&world, acme.ana.id, acme.leave_type.id), (12, 7, 5));
        assert!(world
            .notifications
            .iter()
            .any(|(u, k, _)| *u == acme.ana_user && *k == NotificationType::LeaveApproved));

        let cancelled = svc.cancel(&acme.admin, acme.leave_id).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
        assert_eq!(balance_of(&store.snapshot(), acme.ana.id, acme.leave_type.id), (12, 2, 10));
    }

    #[tokio::test]
    async fn decisions_on_a_closed_leave_change_nothing() {
        for closed in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            let store = Arc::new(MemoryStore::default());
            let acme = seed_company(&store);
            store.edit(|w| w.leaves.iter_mut().for_each(|l| l.status = closed));
            let svc = service(&store);

            let err = svc.approve(&acme.admin, acme.leave_id).await.unwrap_err();
            assert!(matches!(err, AppError::BusinessRule(_)));
            let err = svc.reject(&acme.admin, acme.leave_id, "Sem cobertura").await.unwrap_err();
            assert!(matches!(err, AppError::BusinessRule(_)));

            let world = store.snapshot();
            assert_eq!(status_of(&world, acme.leave_id), closed);
            assert_eq!(balance_of(&world, acme.ana.id, acme.leave_type.id), (12, 2, 10));
            assert!(world.notifications.is_empty());
        }
    }

    #[tokio::test]
    async fn approval_without_balance_row_aborts() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        store.edit(|w| w.balances.clear());

        let err = service(&store).approve(&acme.admin, acme.leave_id).await.unwrap_err();
        assert_eq!(err.public_message(), "No leave balance found for this type.");

        let world = store.snapshot();
        assert_eq!(status_of(&world, acme.leave_id), LeaveStatus::Pending);
        assert!(world.notifications.is_empty());
    }

    #[tokio::test]
    async fn approval_with_short_balance_reports_remaining() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        store.edit(|w| {
            let b = &mut w.balances[0];
            b.used_days = 9;
            b.remaining_days = 3;
        });

        let err = service(&store).approve(&acme.admin, acme.leave_id).await.unwrap_err();
        assert_eq!(err.public_message(), "Insufficient balance. You have 3 day(s) remaining.");

        let world = store.snapshot();
        assert_eq!(status_of(&world, acme.leave_id), LeaveStatus::Pending);
        assert_eq!(balance_of(&world, acme.ana.id, acme.leave_type.id), (12, 9, 3));
    }

    #[tokio::test]
    async fn rejection_requires_reason_and_notifies_employee() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        let svc = service(&store);

        let err = svc.reject(&acme.admin, acme.leave_id, "   ").await.unwrap_err();
        assert_eq!(err.public_message(), "Rejection reason is required.");

        let rejected = svc.reject(&acme.admin, acme.leave_id, "Sem cobertura").await.unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Sem cobertura"));

        let world = store.snapshot();
        assert_eq!(balance_of(&world, acme.ana.id, acme.leave_type.id), (12, 2, 10));
        assert_eq!(
            world.notifications,
            vec![(
                acme.ana_user,
                NotificationType::LeaveRejected,
                "Your leave request was rejected. Reason: Sem cobertura".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn cancel_outside_own_scope_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        let bruno = employee_row(acme.id, "Bruno", EmployeeStatus::Active);
        let bruno_user = Uuid::new_v4();
        store.edit(|w| {
            w.employees.push(bruno.clone());
            w.users.push((acme.id, bruno_user, "bruno@acme.test".into(), false));
        });
        let as_bruno = ctx(acme.id, bruno_user, Role::Employee, "bruno@acme.test");

        let err = service(&store).cancel(&as_bruno, acme.leave_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Leave request")));
        assert_eq!(status_of(&store.snapshot(), acme.leave_id), LeaveStatus::Pending);

        // A própria Ana pode cancelar.
        let as_ana = ctx(acme.id, acme.ana_user, Role::Employee, "ana@acme.test");
        let cancelled = service(&store).cancel(&as_ana, acme.leave_id).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    }

    #[tokio::test]
    async fn apply_notifies_admins_and_manager_once() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        let payload = ApplyLeavePayload {
            employee_id: acme.ana.id,
            leave_type_id: acme.leave_type.id,
            start_date: d(2026, 4, 6),
            end_date: d(2026, 4, 8),
            reason: Some("Viagem".into()),
        };

        let leave = service(&store).apply(&acme.admin, &payload).await.unwrap();
        assert_eq!(leave.days_count, 3);
        assert_eq!(leave.status, LeaveStatus::Pending);

        let world = store.snapshot();
        let mut recipients: Vec<Uuid> = world.notifications.iter().map(|(u, _, _)| *u).collect();
        recipients.sort();
        let mut expected = vec![acme.admin.user_id, acme.manager.user_id];
        expected.sort();
        assert_eq!(recipients, expected);
        assert!(world
            .notifications
            .iter()
            .all(|(_, _, m)| m == "Ana Souza has applied for 3 day(s) of Annual."));
        // Solicitar não mexe no saldo.
        assert_eq!(balance_of(&world, acme.ana.id, acme.leave_type.id), (12, 2, 10));
    }

    // --- Isolamento entre empresas ---

    #[tokio::test]
    async fn other_company_ids_behave_as_missing() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        let globex = seed_company(&store);
        let svc = service(&store);

        let err = svc.approve(&acme.admin, globex.leave_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Leave request")));
        let err = svc.reject(&acme.admin, globex.leave_id, "Não").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Leave request")));
        let err = svc.cancel(&acme.admin, globex.leave_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Leave request")));
        let err = svc.balances(&acme.admin, globex.ana.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Employee")));
        let err = svc.delete_type(acme.id, globex.leave_type.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Leave type")));

        let world = store.snapshot();
        assert_eq!(status_of(&world, globex.leave_id), LeaveStatus::Pending);
        assert_eq!(balance_of(&world, globex.ana.id, globex.leave_type.id), (12, 2, 10));
        assert!(world.types.iter().any(|t| t.id == globex.leave_type.id));
        assert!(world.notifications.is_empty());
    }

    // --- Tipos ---

    #[tokio::test]
    async fn new_type_backfills_every_active_employee() {
        let store = Arc::new(MemoryStore::default());
        let company_id = Uuid::new_v4();
        let active: Vec<Employee> = ["Ana", "Bruno", "Carla"]
            .iter()
            .map(|n| employee_row(company_id, n, EmployeeStatus::Active))
            .collect();
        let gone = employee_row(company_id, "Davi", EmployeeStatus::Deactivated);
        store.edit(|w| {
            w.employees.extend(active.iter().cloned());
            w.employees.push(gone.clone());
        });

        let casual = service(&store)
            .create_type(company_id, &type_payload("Casual", 12, None))
            .await
            .unwrap();
        assert!(casual.is_active);

        let world = store.snapshot();
        let rows: Vec<&LeaveBalance> = world.balances.iter().filter(|b| b.leave_type_id == casual.id).collect();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!((row.total_days, row.used_days, row.remaining_days), (12, 0, 12));
            assert_eq!(row.year, current_year(Utc::now()));
        }
        assert!(rows.iter().all(|b| b.employee_id != gone.id));
    }

    #[tokio::test]
    async fn inactive_type_still_gets_balances() {
        let store = Arc::new(MemoryStore::default());
        let company_id = Uuid::new_v4();
        store.edit(|w| {
            w.employees.push(employee_row(company_id, "Ana", EmployeeStatus::Active));
            w.employees.push(employee_row(company_id, "Bruno", EmployeeStatus::Active));
        });

        let sick = service(&store)
            .create_type(company_id, &type_payload("  Sick  ", 8, Some(false)))
            .await
            .unwrap();
        assert!(!sick.is_active);
        assert_eq!(sick.name, "Sick");

        let world = store.snapshot();
        let rows: Vec<&LeaveBalance> = world.balances.iter().filter(|b| b.leave_type_id == sick.id).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|b| (b.total_days, b.used_days, b.remaining_days) == (8, 0, 8)));
    }

    #[tokio::test]
    async fn update_without_active_flag_keeps_stored_status() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);
        store.edit(|w| w.types.iter_mut().for_each(|t| t.is_active = false));
        let svc = service(&store);

        let updated = svc
            .update_type(acme.id, acme.leave_type.id, &type_payload("Annual Leave", 15, None))
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!((updated.name.as_str(), updated.days_per_year), ("Annual Leave", 15));

        let updated = svc
            .update_type(acme.id, acme.leave_type.id, &type_payload("Annual Leave", 15, Some(true)))
            .await
            .unwrap();
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn type_with_leaves_cannot_be_deleted() {
        let store = Arc::new(MemoryStore::default());
        let acme = seed_company(&store);

        let err = service(&store).delete_type(acme.id, acme.leave_type.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let world = store.snapshot();
        assert_eq!(world.types.len(), 1);
        assert_eq!(world.balances.len(), 1);
    }
}
