use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante mapeia para um status HTTP e uma mensagem segura para o usuário.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Segredo da API inválido")]
    ApiSecretMismatch,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Usuário sem empresa vinculada")]
    CompanyRequired,

    #[error("Usuário já concluiu o onboarding")]
    AlreadyOnboarded,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Também usado para ids de outra empresa: nunca revelamos que o registro existe.
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Conflito: {0}")]
    Conflict(String),

    // Regras de negócio (saldo insuficiente, transição inválida, ...)
    #[error("Regra de negócio: {0}")]
    BusinessRule(String),

    #[error("Serviço de reconhecimento facial indisponível: {0}")]
    FaceServiceUnavailable(String),

    #[error("Relatório compartilhado expirado")]
    ShareExpired,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::ApiSecretMismatch => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::CompanyRequired => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists | AppError::AlreadyOnboarded | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FaceServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ShareExpired => StatusCode::GONE,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem exibida ao cliente. Erros internos nunca vazam detalhes.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "One or more fields are invalid.".to_string(),
            AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::BusinessRule(msg)
            | AppError::FaceServiceUnavailable(msg) => msg.clone(),
            AppError::EmailAlreadyExists => "This email is already in use.".to_string(),
            AppError::InvalidCredentials => "Invalid email or password.".to_string(),
            AppError::InvalidToken => "Missing or invalid authentication token.".to_string(),
            AppError::ApiSecretMismatch => "Unauthorized".to_string(),
            AppError::UserNotFound => "User not found.".to_string(),
            AppError::CompanyRequired => "Complete onboarding before using this resource.".to_string(),
            AppError::AlreadyOnboarded => "This account already belongs to a company.".to_string(),
            AppError::NotFound(what) => format!("{} not found.", what),
            AppError::ShareExpired => "Report expired".to_string(),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": self.public_message(),
                "details": details,
            }));
            return (status, body).into_response();
        }

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente recebe só a genérica.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Traduz violações de unicidade/FK em mensagens acionáveis.
pub fn map_constraint_error(e: sqlx::Error, unique_msg: &str, fk_msg: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(unique_msg.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Conflict(fk_msg.to_string());
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rules_map_to_unprocessable_entity() {
        let err = AppError::BusinessRule("Only pending requests can be approved.".into());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.public_message(), "Only pending requests can be approved.");
    }

    #[test]
    fn foreign_rows_look_like_missing_rows() {
        let err = AppError::NotFound("Employee");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Employee not found.");
    }

    #[test]
    fn internal_errors_never_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "An unexpected error occurred.");
    }

    #[test]
    fn face_service_failures_are_service_unavailable() {
        let err = AppError::FaceServiceUnavailable("Face recognition service is not running.".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn expired_share_is_gone() {
        assert_eq!(AppError::ShareExpired.status_code(), StatusCode::GONE);
    }
}
