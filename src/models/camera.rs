// src/models/camera.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Active,
    Inactive,
    Error,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: Uuid,
    pub company_id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub rtsp_url: String,
    pub description: Option<String>,
    pub status: CameraStatus,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CameraListItem {
    pub id: Uuid,
    pub name: String,
    pub rtsp_url: String,
    pub description: Option<String>,
    pub status: CameraStatus,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub location_id: Uuid,
    pub location_name: String,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CameraPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(length(min = 8, message = "RTSP URL is required."))]
    #[schema(example = "rtsp://10.0.0.20:554/stream1")]
    pub rtsp_url: String,
    pub location_id: Uuid,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CameraStatusPayload {
    pub status: CameraStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestRtspPayload {
    #[validate(length(min = 8, message = "RTSP URL is required."))]
    pub rtsp_url: String,
}

// Resposta genérica das operações de câmera no serviço facial
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CameraActionResponse {
    pub success: bool,
    pub message: String,
}
