// src/db/camera_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::camera::{Camera, CameraListItem, CameraStatus},
};

const CAMERA_COLUMNS: &str =
    "id, company_id, location_id, name, rtsp_url, description, status, last_connected_at, created_at, updated_at";

#[derive(Clone)]
pub struct CameraRepository {
    pool: PgPool,
}

impl CameraRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<CameraListItem>, AppError> {
        let cameras = sqlx::query_as::<_, CameraListItem>(
            r#"
            SELECT c.id, c.name, c.rtsp_url, c.description, c.status, c.last_connected_at,
                   c.location_id, l.name AS location_name
            FROM camera c
            JOIN location l ON l.id = c.location_id
            WHERE c.company_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cameras)
    }

    pub async fn find(&self, company_id: Uuid, id: Uuid) -> Result<Option<Camera>, AppError> {
        let camera = sqlx::query_as::<_, Camera>(&format!(
            "SELECT {} FROM camera WHERE id = $1 AND company_id = $2",
            CAMERA_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(camera)
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        name: &str,
        rtsp_url: &str,
        description: Option<&str>,
    ) -> Result<Camera, AppError> {
        let camera = sqlx::query_as::<_, Camera>(&format!(
            r#"
            INSERT INTO camera (company_id, location_id, name, rtsp_url, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CAMERA_COLUMNS
        ))
        .bind(company_id)
        .bind(location_id)
        .bind(name)
        .bind(rtsp_url)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(camera)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        location_id: Uuid,
        name: &str,
        rtsp_url: &str,
        description: Option<&str>,
    ) -> Result<Option<Camera>, AppError> {
        let camera = sqlx::query_as::<_, Camera>(&format!(
            r#"
            UPDATE camera SET location_id = $3, name = $4, rtsp_url = $5, description = $6, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            CAMERA_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(location_id)
        .bind(name)
        .bind(rtsp_url)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(camera)
    }

    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM camera WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// `connected` também carimba `last_connected_at`.
    pub async fn set_status(
        &self,
        company_id: Uuid,
        id: Uuid,
        status: CameraStatus,
        connected: bool,
    ) -> Result<Option<Camera>, AppError> {
        let camera = sqlx::query_as::<_, Camera>(&format!(
            r#"
            UPDATE camera SET
                status = $3,
                last_connected_at = CASE WHEN $4 THEN NOW() ELSE last_connected_at END,
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            CAMERA_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(status)
        .bind(connected)
        .fetch_optional(&self.pool)
        .await?;
        Ok(camera)
    }
}
