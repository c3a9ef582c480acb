// src/services/notification_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    middleware::tenancy::TenantContext,
    models::notification::Notification,
};

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;
pub const MAX_NOTIFICATION_LIMIT: i64 = 100;

pub fn resolve_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT)
}

// Sempre restrito ao próprio usuário dentro da empresa
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    pub async fn list(&self, ctx: &TenantContext, limit: Option<i64>) -> Result<Vec<Notification>, AppError> {
        self.notification_repo
            .list_for_user(ctx.company_id, ctx.user_id, resolve_limit(limit))
            .await
    }

    pub async fn unread_count(&self, ctx: &TenantContext) -> Result<i64, AppError> {
        self.notification_repo.unread_count(ctx.company_id, ctx.user_id).await
    }

    /// Notificação de outro usuário responde como inexistente.
    pub async fn mark_read(&self, ctx: &TenantContext, id: Uuid) -> Result<(), AppError> {
        let updated = self
            .notification_repo
            .mark_read(ctx.company_id, ctx.user_id, id)
            .await?;
        if updated == 0 {
            return Err(AppError::NotFound("Notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, ctx: &TenantContext) -> Result<u64, AppError> {
        self.notification_repo.mark_all_read(ctx.company_id, ctx.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(resolve_limit(None), 20);
        assert_eq!(resolve_limit(Some(0)), 1);
        assert_eq!(resolve_limit(Some(500)), 100);
        assert_eq!(resolve_limit(Some(35)), 35);
    }
}
