// src/services/camera_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_in_company, OwnedTable},
        error::AppError,
    },
    db::CameraRepository,
    models::camera::{Camera, CameraActionResponse, CameraListItem, CameraPayload, CameraStatus},
    services::face_client::{FaceRecognition, StreamStartRequest},
};

// Um quadro a cada 30 é enviado para identificação.
const STREAM_FRAME_INTERVAL: u32 = 30;

#[derive(Clone)]
pub struct CameraService {
    camera_repo: CameraRepository,
    face: Arc<dyn FaceRecognition>,
    pool: PgPool,
    callback_url: String,
}

impl CameraService {
    /// `public_base_url` é onde o serviço facial alcança esta API.
    pub fn new(
        camera_repo: CameraRepository,
        face: Arc<dyn FaceRecognition>,
        pool: PgPool,
        public_base_url: &str,
    ) -> Self {
        let callback_url = format!("{}/api/attendance/log", public_base_url.trim_end_matches('/'));
        Self { camera_repo, face, pool, callback_url }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<CameraListItem>, AppError> {
        self.camera_repo.list(company_id).await
    }

    pub async fn create(&self, company_id: Uuid, payload: &CameraPayload) -> Result<Camera, AppError> {
        ensure_in_company(&self.pool, OwnedTable::Location, payload.location_id, company_id).await?;
        self.camera_repo
            .create(
                company_id,
                payload.location_id,
                payload.name.trim(),
                payload.rtsp_url.trim(),
                payload.description.as_deref(),
            )
            .await
    }

    pub async fn update(&self, company_id: Uuid, id: Uuid, payload: &CameraPayload) -> Result<Camera, AppError> {
        ensure_in_company(&self.pool, OwnedTable::Location, payload.location_id, company_id).await?;
        self.camera_repo
            .update(
                company_id,
                id,
                payload.location_id,
                payload.name.trim(),
                payload.rtsp_url.trim(),
                payload.description.as_deref(),
            )
            .await?
            .ok_or(AppError::NotFound("Camera"))
    }

    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.camera_repo.delete(company_id, id).await? {
            0 => Err(AppError::NotFound("Camera")),
            _ => Ok(()),
        }
    }

    pub async fn set_status(&self, company_id: Uuid, id: Uuid, status: CameraStatus) -> Result<Camera, AppError> {
        self.camera_repo
            .set_status(company_id, id, status, false)
            .await?
            .ok_or(AppError::NotFound("Camera"))
    }

    // =============================================================================
    //  STREAMS (via serviço facial)
    // =============================================================================

    pub async fn test_rtsp(&self, rtsp_url: &str) -> Result<CameraActionResponse, AppError> {
        let reply = self
            .face
            .test_rtsp(rtsp_url.trim())
            .await
            .map_err(|e| e.into_app_error("Failed to test RTSP connection."))?;

        Ok(CameraActionResponse { success: reply.success, message: reply.message })
    }

    /// Sucesso marca a câmera como ativa e carimba a conexão.
    pub async fn start_stream(&self, company_id: Uuid, id: Uuid) -> Result<CameraActionResponse, AppError> {
        let camera = self
            .camera_repo
            .find(company_id, id)
            .await?
            .ok_or(AppError::NotFound("Camera"))?;

        let request = StreamStartRequest {
            camera_id: camera.id,
            rtsp_url: camera.rtsp_url.clone(),
            company_id,
            location_id: camera.location_id,
            callback_url: self.callback_url.clone(),
            frame_interval: STREAM_FRAME_INTERVAL,
        };

        let reply = self
            .face
            .start_stream(request)
            .await
            .map_err(|e| e.into_app_error("Failed to start camera stream."))?;

        if reply.success {
            self.camera_repo
                .set_status(company_id, id, CameraStatus::Active, true)
                .await?;
            tracing::info!("🎥 Stream da câmera {} iniciado", id);
        }

        Ok(CameraActionResponse { success: reply.success, message: reply.message })
    }

    pub async fn stop_stream(&self, company_id: Uuid, id: Uuid) -> Result<CameraActionResponse, AppError> {
        ensure_in_company(&self.pool, OwnedTable::Camera, id, company_id).await?;

        let reply = self
            .face
            .stop_stream(id)
            .await
            .map_err(|e| e.into_app_error("Failed to stop camera stream."))?;

        if reply.success {
            self.camera_repo
                .set_status(company_id, id, CameraStatus::Inactive, false)
                .await?;
            tracing::info!("⏹️ Stream da câmera {} parado", id);
        }

        Ok(CameraActionResponse { success: reply.success, message: reply.message })
    }
}
