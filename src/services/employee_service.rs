// src/services/employee_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_in_company, ensure_optional_in_company, OwnedTable},
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::EmployeeRepository,
    models::employee::{
        DetectionResult, Employee, EmployeeFilters, EmployeeListItem, EmployeePayload, EmployeeStatus,
        EnrollmentResult,
    },
    services::face_client::{FaceRecognition, ImageUpload},
};

const MSG_ENROLL_FAILED: &str = "Failed to enroll face.";
const MSG_DETECT_FAILED: &str = "Failed to detect face.";

#[derive(Clone)]
pub struct EmployeeService {
    employee_repo: EmployeeRepository,
    face: Arc<dyn FaceRecognition>,
    pool: PgPool,
}

impl EmployeeService {
    pub fn new(employee_repo: EmployeeRepository, face: Arc<dyn FaceRecognition>, pool: PgPool) -> Self {
        Self { employee_repo, face, pool }
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        filters: &EmployeeFilters,
        page: PageParams,
    ) -> Result<Page<EmployeeListItem>, AppError> {
        let (items, total) = self.employee_repo.list(company_id, filters, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get(&self, company_id: Uuid, id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or(AppError::NotFound("Employee"))
    }

    /// Referências (unidade, departamento, turno) precisam ser da mesma empresa.
    async fn check_references(&self, company_id: Uuid, payload: &EmployeePayload) -> Result<(), AppError> {
        ensure_in_company(&self.pool, OwnedTable::Location, payload.location_id, company_id).await?;
        ensure_optional_in_company(&self.pool, OwnedTable::Department, payload.department_id, company_id).await?;
        ensure_optional_in_company(&self.pool, OwnedTable::Shift, payload.shift_id, company_id).await?;
        Ok(())
    }

    pub async fn create(&self, company_id: Uuid, payload: &EmployeePayload) -> Result<Employee, AppError> {
        self.check_references(company_id, payload).await?;
        let employee = self.employee_repo.create(&self.pool, company_id, payload).await?;
        tracing::info!("🧑‍💼 Funcionário {} cadastrado", employee.employee_code);
        Ok(employee)
    }

    pub async fn update(&self, company_id: Uuid, id: Uuid, payload: &EmployeePayload) -> Result<Employee, AppError> {
        self.check_references(company_id, payload).await?;
        self.employee_repo
            .update(&self.pool, company_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("Employee"))
    }

    /// Exclusão lógica: o histórico de ponto e afastamentos permanece.
    pub async fn deactivate(&self, company_id: Uuid, id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .set_status(company_id, id, EmployeeStatus::Deactivated)
            .await?
            .ok_or(AppError::NotFound("Employee"))
    }

    // =============================================================================
    //  BIOMETRIA
    // =============================================================================

    pub async fn enroll_face(
        &self,
        company_id: Uuid,
        id: Uuid,
        images: Vec<ImageUpload>,
    ) -> Result<EnrollmentResult, AppError> {
        if images.is_empty() {
            return Err(AppError::BadRequest("At least one image is required.".into()));
        }
        ensure_in_company(&self.pool, OwnedTable::Employee, id, company_id).await?;

        let reply = self
            .face
            .enroll(company_id, id, images)
            .await
            .map_err(|e| e.into_app_error(MSG_ENROLL_FAILED))?;

        if !reply.success {
            let message = if reply.message.is_empty() { MSG_ENROLL_FAILED.to_string() } else { reply.message };
            return Err(AppError::BadRequest(message));
        }

        self.employee_repo
            .set_enrollment(company_id, id, Some(reply.face_count))
            .await?;

        tracing::info!("📸 Rosto cadastrado para {} ({} imagens)", id, reply.face_count);
        Ok(EnrollmentResult { success: true, face_count: reply.face_count })
    }

    /// Remove o cadastro facial. O banco é limpo mesmo se o serviço facial falhar.
    pub async fn remove_face(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        ensure_in_company(&self.pool, OwnedTable::Employee, id, company_id).await?;

        if let Err(e) = self.face.remove_enrollment(company_id, id).await {
            tracing::warn!("⚠️ Falha ao remover rosto de {} no serviço facial: {}", id, e);
        }

        self.employee_repo.set_enrollment(company_id, id, None).await?;
        Ok(())
    }

    pub async fn detect_face(&self, image: ImageUpload) -> Result<DetectionResult, AppError> {
        let reply = self
            .face
            .detect(image)
            .await
            .map_err(|e| e.into_app_error(MSG_DETECT_FAILED))?;

        Ok(DetectionResult {
            detected: reply.detected,
            face_count: reply.face_count,
            confidence: reply.confidence,
            message: reply.message,
        })
    }
}
