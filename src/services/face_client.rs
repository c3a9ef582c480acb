// src/services/face_client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::common::error::AppError;

pub const MSG_SERVICE_DOWN: &str = "Face recognition service is not running.";
pub const MSG_IDENTIFY_FAILED: &str = "Face identification service error.";

/// Imagem recebida por multipart e repassada ao serviço facial.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn into_part(self) -> Result<Part, FaceServiceError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(mime) => part
                .mime_str(&mime)
                .map_err(|e| FaceServiceError::Decode(format!("content-type inválido: {}", e))),
            None => Ok(part),
        }
    }
}

// ---
// Erros e resultado etiquetado
// ---

#[derive(Debug, Error)]
pub enum FaceServiceError {
    #[error("serviço facial inacessível: {0}")]
    Unreachable(String),

    #[error("serviço facial respondeu {status}: {detail:?}")]
    Status { status: u16, detail: Option<String> },

    #[error("resposta inválida do serviço facial: {0}")]
    Decode(String),
}

impl FaceServiceError {
    /// Converte em erro de API; `fallback` é a mensagem para respostas não-2xx sem `detail`.
    pub fn into_app_error(self, fallback: &str) -> AppError {
        tracing::warn!("⚠️ Falha no serviço facial: {}", self);
        let message = match self {
            FaceServiceError::Unreachable(_) => MSG_SERVICE_DOWN.to_string(),
            FaceServiceError::Status { detail: Some(detail), .. } => detail,
            FaceServiceError::Status { detail: None, .. } | FaceServiceError::Decode(_) => {
                fallback.to_string()
            }
        };
        AppError::FaceServiceUnavailable(message)
    }
}

impl From<reqwest::Error> for FaceServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FaceServiceError::Decode(e.to_string())
        } else {
            FaceServiceError::Unreachable(e.to_string())
        }
    }
}

/// Resultado da identificação. "Não reconhecido" não é erro.
#[derive(Debug)]
pub enum IdentifyResult {
    Identified { employee_id: Uuid, confidence: f64 },
    NotIdentified { reason: String, confidence: Option<f64> },
    ServiceError(FaceServiceError),
}

// Formato bruto devolvido por POST /api/v1/attendance/identify
#[derive(Debug, Deserialize)]
pub struct IdentifyWire {
    #[serde(default)]
    pub identified: bool,
    pub employee_id: Option<String>,
    pub confidence: Option<f64>,
    pub message: Option<String>,
}

impl IdentifyResult {
    pub fn from_wire(wire: IdentifyWire) -> Self {
        let reason = wire
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Face not recognized".to_string());

        match (wire.identified, wire.employee_id) {
            (true, Some(raw_id)) => match Uuid::parse_str(&raw_id) {
                Ok(employee_id) => IdentifyResult::Identified {
                    employee_id,
                    confidence: wire.confidence.unwrap_or(0.0),
                },
                Err(_) => IdentifyResult::ServiceError(FaceServiceError::Decode(format!(
                    "employee_id inválido: {}",
                    raw_id
                ))),
            },
            _ => IdentifyResult::NotIdentified { reason, confidence: wire.confidence },
        }
    }
}

// ---
// Contratos JSON das demais rotas
// ---

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentReply {
    pub success: bool,
    #[serde(default)]
    pub face_count: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectReply {
    pub detected: bool,
    #[serde(default)]
    pub face_count: i32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionReply {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamStartRequest {
    pub camera_id: Uuid,
    pub rtsp_url: String,
    pub company_id: Uuid,
    pub location_id: Uuid,
    pub callback_url: String,
    pub frame_interval: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

// ---
// O trait (costura para testes) e a implementação HTTP
// ---

#[async_trait]
pub trait FaceRecognition: Send + Sync {
    async fn identify(&self, company_id: Uuid, image: ImageUpload) -> IdentifyResult;

    async fn enroll(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        images: Vec<ImageUpload>,
    ) -> Result<EnrollmentReply, FaceServiceError>;

    async fn remove_enrollment(&self, company_id: Uuid, employee_id: Uuid) -> Result<(), FaceServiceError>;

    async fn detect(&self, image: ImageUpload) -> Result<DetectReply, FaceServiceError>;

    async fn test_rtsp(&self, rtsp_url: &str) -> Result<ActionReply, FaceServiceError>;

    async fn start_stream(&self, request: StreamStartRequest) -> Result<ActionReply, FaceServiceError>;

    async fn stop_stream(&self, camera_id: Uuid) -> Result<ActionReply, FaceServiceError>;
}

#[derive(Clone)]
pub struct HttpFaceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFaceClient {
    /// Toda chamada herda o timeout do cliente.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Lê o corpo como `T` quando 2xx; caso contrário extrai o `detail` (se houver).
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FaceServiceError> {
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorDetail>()
                .await
                .ok()
                .and_then(|body| body.detail);
            return Err(FaceServiceError::Status { status: status.as_u16(), detail });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| FaceServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FaceRecognition for HttpFaceClient {
    async fn identify(&self, company_id: Uuid, image: ImageUpload) -> IdentifyResult {
        let part = match image.into_part() {
            Ok(part) => part,
            Err(e) => return IdentifyResult::ServiceError(e),
        };
        let form = Form::new()
            .text("company_id", company_id.to_string())
            .part("image", part);

        let response = match self
            .client
            .post(self.url("/api/v1/attendance/identify"))
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return IdentifyResult::ServiceError(e.into()),
        };

        match Self::read_json::<IdentifyWire>(response).await {
            Ok(wire) => IdentifyResult::from_wire(wire),
            Err(e) => IdentifyResult::ServiceError(e),
        }
    }

    async fn enroll(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        images: Vec<ImageUpload>,
    ) -> Result<EnrollmentReply, FaceServiceError> {
        let mut form = Form::new()
            .text("company_id", company_id.to_string())
            .text("employee_id", employee_id.to_string());
        for image in images {
            form = form.part("images", image.into_part()?);
        }

        let response = self
            .client
            .post(self.url("/api/v1/enroll"))
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn remove_enrollment(&self, company_id: Uuid, employee_id: Uuid) -> Result<(), FaceServiceError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/v1/enroll/{}/{}", company_id, employee_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FaceServiceError::Status {
                status: response.status().as_u16(),
                detail: None,
            });
        }
        Ok(())
    }

    async fn detect(&self, image: ImageUpload) -> Result<DetectReply, FaceServiceError> {
        let form = Form::new().part("image", image.into_part()?);
        let response = self
            .client
            .post(self.url("/api/v1/enroll/detect"))
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn test_rtsp(&self, rtsp_url: &str) -> Result<ActionReply, FaceServiceError> {
        let response = self
            .client
            .post(self.url("/api/v1/camera/test-rtsp"))
            .json(&serde_json::json!({ "rtsp_url": rtsp_url }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn start_stream(&self, request: StreamStartRequest) -> Result<ActionReply, FaceServiceError> {
        let response = self
            .client
            .post(self.url("/api/v1/stream/start"))
            .json(&request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn stop_stream(&self, camera_id: Uuid) -> Result<ActionReply, FaceServiceError> {
        let response = self
            .client
            .post(self.url("/api/v1/stream/stop"))
            .json(&serde_json::json!({ "camera_id": camera_id }))
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tokio::net::TcpListener;

    fn wire(identified: bool, employee_id: Option<&str>, message: Option<&str>) -> IdentifyWire {
        IdentifyWire {
            identified,
            employee_id: employee_id.map(String::from),
            confidence: Some(0.91),
            message: message.map(String::from),
        }
    }

    fn image() -> ImageUpload {
        ImageUpload {
            file_name: "capture.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn identified_with_valid_id() {
        let id = Uuid::new_v4();
        match IdentifyResult::from_wire(wire(true, Some(&id.to_string()), None)) {
            IdentifyResult::Identified { employee_id, confidence } => {
                assert_eq!(employee_id, id);
                assert_eq!(confidence, 0.91);
            }
            other => panic!("esperado Identified, veio {:?}", other),
        }
    }

    #[test]
    fn identified_flag_without_id_is_a_miss() {
        match IdentifyResult::from_wire(wire(true, None, None)) {
            IdentifyResult::NotIdentified { reason, confidence } => {
                assert_eq!(reason, "Face not recognized");
                assert_eq!(confidence, Some(0.91));
            }
            other => panic!("esperado NotIdentified, veio {:?}", other),
        }
    }

    #[test]
    fn miss_keeps_service_message() {
        match IdentifyResult::from_wire(wire(false, None, Some("No face detected"))) {
            IdentifyResult::NotIdentified { reason, .. } => assert_eq!(reason, "No face detected"),
            other => panic!("esperado NotIdentified, veio {:?}", other),
        }
    }

    #[test]
    fn malformed_employee_id_is_a_service_error() {
        assert!(matches!(
            IdentifyResult::from_wire(wire(true, Some("emp-42"), None)),
            IdentifyResult::ServiceError(FaceServiceError::Decode(_))
        ));
    }

    #[test]
    fn unreachable_maps_to_service_down_message() {
        let err = FaceServiceError::Unreachable("connection refused".into()).into_app_error(MSG_IDENTIFY_FAILED);
        assert_eq!(err.public_message(), MSG_SERVICE_DOWN);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn status_error_prefers_detail_over_fallback() {
        let with_detail = FaceServiceError::Status { status: 400, detail: Some("No face found in image 2".into()) };
        assert_eq!(with_detail.into_app_error("Failed to enroll face.").public_message(), "No face found in image 2");

        let without = FaceServiceError::Status { status: 500, detail: None };
        assert_eq!(without.into_app_error("Failed to enroll face.").public_message(), "Failed to enroll face.");
    }

    #[tokio::test]
    async fn identify_against_running_service() {
        let id = Uuid::new_v4();
        let router = Router::new().route(
            "/api/v1/attendance/identify",
            post(move || async move {
                Json(serde_json::json!({
                    "identified": true,
                    "employee_id": id.to_string(),
                    "confidence": 0.87,
                    "message": "ok"
                }))
            }),
        );
        let base = spawn(router).await;
        let client = HttpFaceClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.identify(Uuid::new_v4(), image()).await {
            IdentifyResult::Identified { employee_id, confidence } => {
                assert_eq!(employee_id, id);
                assert_eq!(confidence, 0.87);
            }
            other => panic!("esperado Identified, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_2xx_becomes_status_error() {
        let router = Router::new().route(
            "/api/v1/enroll",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "detail": "No face found" })),
                )
            }),
        );
        let base = spawn(router).await;
        let client = HttpFaceClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .enroll(Uuid::new_v4(), Uuid::new_v4(), vec![image()])
            .await
            .unwrap_err();
        match err {
            FaceServiceError::Status { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("No face found"));
            }
            other => panic!("esperado Status, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn hung_service_hits_the_timeout() {
        let router = Router::new().route(
            "/api/v1/camera/test-rtsp",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({ "success": true, "message": "late" }))
            }),
        );
        let base = spawn(router).await;
        let client = HttpFaceClient::new(&base, Duration::from_millis(200)).unwrap();

        let err = client.test_rtsp("rtsp://10.0.0.20/stream").await.unwrap_err();
        assert!(matches!(err, FaceServiceError::Unreachable(_)));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        // Porta reservada e fechada
        let client = HttpFaceClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let result = client.identify(Uuid::new_v4(), image()).await;
        assert!(matches!(result, IdentifyResult::ServiceError(FaceServiceError::Unreachable(_))));
    }
}
