// src/services/company_service.rs
//
// Onboarding da empresa e cadastro organizacional (unidades e departamentos).

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_optional_in_company, OwnedTable},
        error::AppError,
    },
    db::{CompanyRepository, UserRepository},
    models::{
        auth::{Role, User},
        company::{
            Department, DepartmentListItem, DepartmentPayload, Location, LocationPayload, OnboardingPayload,
            OnboardingResponse,
        },
        report::DashboardStats,
    },
};

const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(company_repo: CompanyRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { company_repo, user_repo, pool }
    }

    // =============================================================================
    //  ONBOARDING
    // =============================================================================

    /// Cria empresa + primeira unidade e promove o usuário a super_admin, tudo ou nada.
    pub async fn onboard(&self, user: &User, payload: &OnboardingPayload) -> Result<OnboardingResponse, AppError> {
        if user.company_id.is_some() {
            return Err(AppError::AlreadyOnboarded);
        }

        let mut tx = self.pool.begin().await?;

        let company = self
            .company_repo
            .create_company(
                &mut *tx,
                payload.company_name.trim(),
                payload.industry.as_deref(),
                payload.size.as_deref(),
            )
            .await?;

        let location = self
            .company_repo
            .create_location(
                &mut *tx,
                company.id,
                payload.location_name.trim(),
                payload.location_address.as_deref(),
                payload.location_city.trim(),
                payload.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE),
            )
            .await?;

        // Outra requisição concorrente já vinculou o usuário: desfaz tudo.
        self.user_repo
            .attach_to_company(&mut *tx, user.id, company.id, Role::SuperAdmin)
            .await?
            .ok_or(AppError::AlreadyOnboarded)?;

        tx.commit().await?;

        tracing::info!("🏢 Empresa '{}' criada por {}", company.name, user.id);
        Ok(OnboardingResponse { company, location })
    }

    pub async fn dashboard_stats(&self, company_id: Uuid) -> Result<DashboardStats, AppError> {
        self.company_repo.dashboard_stats(company_id).await
    }

    // =============================================================================
    //  UNIDADES
    // =============================================================================

    pub async fn list_locations(&self, company_id: Uuid) -> Result<Vec<Location>, AppError> {
        self.company_repo.list_locations(company_id).await
    }

    pub async fn create_location(&self, company_id: Uuid, payload: &LocationPayload) -> Result<Location, AppError> {
        self.company_repo
            .create_location(
                &self.pool,
                company_id,
                payload.name.trim(),
                payload.address.as_deref(),
                payload.city.trim(),
                payload.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE),
            )
            .await
    }

    pub async fn update_location(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &LocationPayload,
    ) -> Result<Location, AppError> {
        self.company_repo
            .update_location(
                company_id,
                id,
                payload.name.trim(),
                payload.address.as_deref(),
                payload.city.trim(),
                payload.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE),
                payload.is_active,
            )
            .await?
            .ok_or(AppError::NotFound("Location"))
    }

    pub async fn delete_location(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.company_repo.delete_location(company_id, id).await? {
            0 => Err(AppError::NotFound("Location")),
            _ => Ok(()),
        }
    }

    // =============================================================================
    //  DEPARTAMENTOS
    // =============================================================================

    pub async fn list_departments(&self, company_id: Uuid) -> Result<Vec<DepartmentListItem>, AppError> {
        self.company_repo.list_departments(company_id).await
    }

    pub async fn create_department(&self, company_id: Uuid, payload: &DepartmentPayload) -> Result<Department, AppError> {
        ensure_optional_in_company(&self.pool, OwnedTable::User, payload.manager_id, company_id).await?;
        self.company_repo
            .create_department(company_id, payload.name.trim(), payload.manager_id)
            .await
    }

    pub async fn update_department(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &DepartmentPayload,
    ) -> Result<Department, AppError> {
        ensure_optional_in_company(&self.pool, OwnedTable::User, payload.manager_id, company_id).await?;
        self.company_repo
            .update_department(company_id, id, payload.name.trim(), payload.manager_id)
            .await?
            .ok_or(AppError::NotFound("Department"))
    }

    pub async fn delete_department(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.company_repo.delete_department(company_id, id).await? {
            0 => Err(AppError::NotFound("Department")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sem `isActive` no corpo, o UPDATE recebe NULL e o COALESCE mantém o valor gravado.
    #[test]
    fn location_update_without_active_flag_leaves_it_untouched() {
        let payload: LocationPayload =
            serde_json::from_str(r#"{"name":"Matriz","city":"Recife"}"#).unwrap();
        assert_eq!(payload.is_active, None);

        let payload: LocationPayload =
            serde_json::from_str(r#"{"name":"Matriz","city":"Recife","isActive":false}"#).unwrap();
        assert_eq!(payload.is_active, Some(false));
    }
}
