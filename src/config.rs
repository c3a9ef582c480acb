// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AttendanceRepository, CameraRepository, CompanyRepository, EmployeeRepository,
        NotificationRepository, ReportRepository, ShiftRepository, UserRepository,
    },
    services::{
        attendance_service::{AttendanceRecorder, AttendanceService, PgAttendanceStore},
        auth::AuthService,
        camera_service::CameraService,
        company_service::CompanyService,
        employee_service::EmployeeService,
        face_client::{FaceRecognition, HttpFaceClient},
        leave_service::{LeaveService, PgLeaveStore},
        notification_service::NotificationService,
        report_service::ReportService,
        shift_service::ShiftService,
    },
};

const DEFAULT_FACE_SERVICE_URL: &str = "http://localhost:8000";
const DEFAULT_FACE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bind_addr: String,
    // Quando definido, o callback das câmeras exige o cabeçalho `x-api-secret`
    pub internal_api_secret: Option<String>,

    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub employee_service: EmployeeService,
    pub shift_service: ShiftService,
    pub camera_service: CameraService,
    pub attendance_service: AttendanceService,
    pub leave_service: LeaveService,
    pub notification_service: NotificationService,
    pub report_service: ReportService,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let face_url = optional_var("FACE_SERVICE_URL").unwrap_or_else(|| DEFAULT_FACE_SERVICE_URL.to_string());
        let face_timeout = match optional_var("FACE_SERVICE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("FACE_SERVICE_TIMEOUT_SECS deve ser um número inteiro")?,
            None => DEFAULT_FACE_TIMEOUT_SECS,
        };
        let public_base_url = optional_var("PUBLIC_BASE_URL").unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());
        let bind_addr = optional_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let internal_api_secret = optional_var("INTERNAL_API_SECRET");

        if internal_api_secret.is_none() {
            tracing::warn!("⚠️ INTERNAL_API_SECRET não definido: /api/attendance/log aceita chamadas sem segredo.");
        }

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let face: Arc<dyn FaceRecognition> =
            Arc::new(HttpFaceClient::new(&face_url, Duration::from_secs(face_timeout))?);
        tracing::info!("🧠 Serviço facial em {} (timeout {}s)", face_url, face_timeout);

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let shift_repo = ShiftRepository::new(db_pool.clone());
        let camera_repo = CameraRepository::new(db_pool.clone());
        let attendance_repo = AttendanceRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret, db_pool.clone());
        let company_service = CompanyService::new(company_repo, user_repo, db_pool.clone());
        let employee_service = EmployeeService::new(employee_repo, face.clone(), db_pool.clone());
        let shift_service = ShiftService::new(shift_repo, db_pool.clone());
        let camera_service = CameraService::new(camera_repo, face.clone(), db_pool.clone(), &public_base_url);

        let recorder = AttendanceRecorder::new(Arc::new(PgAttendanceStore::new(db_pool.clone())), face);
        let attendance_service = AttendanceService::new(recorder, attendance_repo);

        let leave_service = LeaveService::new(Arc::new(PgLeaveStore::new(db_pool.clone())));
        let notification_service = NotificationService::new(notification_repo);
        let report_service = ReportService::new(report_repo);

        Ok(Self {
            db_pool,
            bind_addr,
            internal_api_secret,
            auth_service,
            company_service,
            employee_service,
            shift_service,
            camera_service,
            attendance_service,
            leave_service,
            notification_service,
            report_service,
        })
    }
}
