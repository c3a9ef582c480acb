// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

// Contexto da sessão dentro da empresa.
// A empresa vem SEMPRE do usuário autenticado, nunca de cabeçalho ou corpo.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

impl TenantContext {
    /// `None` enquanto o usuário não concluiu o onboarding.
    pub fn from_user(user: &User) -> Option<Self> {
        Some(Self {
            company_id: user.company_id?,
            user_id: user.id,
            role: user.role,
            email: user.email.clone(),
        })
    }
}

// Preenchido pelo `tenant_guard`; fora dele a rota não tem empresa.
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or(AppError::CompanyRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(company_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ana@acme.com".into(),
            password_hash: String::new(),
            name: None,
            company_id,
            role: Role::Manager,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn context_requires_company() {
        assert!(TenantContext::from_user(&user(None)).is_none());

        let company = Uuid::new_v4();
        let u = user(Some(company));
        let ctx = TenantContext::from_user(&u).unwrap();
        assert_eq!(ctx.company_id, company);
        assert_eq!(ctx.user_id, u.id);
        assert_eq!(ctx.role, Role::Manager);
    }
}
