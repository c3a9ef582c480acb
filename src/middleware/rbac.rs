// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantContext,
    models::auth::Role,
};

/// 1. O Trait que define quais papéis liberam a rota
pub trait RoleRequirement: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
    fn description() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or(AppError::CompanyRequired)?;

        if !T::allows(tenant.role) {
            tracing::debug!("🚫 Papel {:?} barrado: {}", tenant.role, T::description());
            return Err(AppError::Forbidden(format!("{} required.", T::description())));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

/// super_admin / hr_admin
pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allows(role: Role) -> bool {
        role.is_admin()
    }
    fn description() -> &'static str {
        "Admin access"
    }
}

/// Administradores e gerentes
pub struct ManagerOrAbove;
impl RoleRequirement for ManagerOrAbove {
    fn allows(role: Role) -> bool {
        role.is_admin() || role == Role::Manager
    }
    fn description() -> &'static str {
        "Manager access"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_follow_role_hierarchy() {
        assert!(AdminOnly::allows(Role::SuperAdmin));
        assert!(AdminOnly::allows(Role::HrAdmin));
        assert!(!AdminOnly::allows(Role::Manager));
        assert!(ManagerOrAbove::allows(Role::Manager));
        assert!(!ManagerOrAbove::allows(Role::Employee));
    }
}
