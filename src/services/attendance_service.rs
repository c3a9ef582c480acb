// src/services/attendance_service.rs
//
// Registro de ponto: quiosque (reconhecimento facial), lançamento manual e
// callback do pipeline de câmeras. Leituras do histórico no final.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        dates::day_bounds,
        db_utils::{ensure_in_company, OwnedTable},
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::{AttendanceRepository, CompanyRepository, EmployeeRepository, NotificationRepository, ShiftRepository, UserRepository},
    models::{
        attendance::{
            AttendanceCallbackPayload, AttendanceCallbackResponse, AttendanceFilters, AttendanceLog,
            AttendanceLogItem, AttendanceMetrics, AttendanceSource, AttendanceType, KioskCheckInResponse,
            ManualCheckInPayload, NewAttendanceLog, RecentActivityItem, TodayStats,
        },
        notification::{NewNotification, NotificationType},
    },
    services::{
        face_client::{FaceRecognition, IdentifyResult, ImageUpload, MSG_IDENTIFY_FAILED},
        shift_metrics::{compute_metrics, local_wall_clock, ShiftWindow},
    },
};

/// Janela de deduplicação por (empresa, funcionário, unidade).
pub const ATTENDANCE_DEDUP_WINDOW_MINUTES: i64 = 5;

const RECENT_DEFAULT_LIMIT: i64 = 20;
const RECENT_MAX_LIMIT: i64 = 100;

pub fn dedup_cutoff(captured_at: DateTime<Utc>) -> DateTime<Utc> {
    captured_at - Duration::minutes(ATTENDANCE_DEDUP_WINDOW_MINUTES)
}

/// O que o registrador precisa saber de um funcionário.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub id: Uuid,
    pub full_name: String,
    pub code: String,
    pub email: Option<String>,
    pub active: bool,
    pub shift: Option<ShiftWindow>,
}

// =============================================================================
//  PERSISTÊNCIA (trait para permitir dublês em teste)
// =============================================================================

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fuso da unidade; `None` se a unidade não for da empresa.
    async fn location_timezone(&self, company_id: Uuid, location_id: Uuid) -> Result<Option<String>, AppError>;

    async fn employee(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<RosterEntry>, AppError>;

    async fn camera_in_company(&self, company_id: Uuid, camera_id: Uuid) -> Result<bool, AppError>;

    /// Verificação + inserção atômicas. `None` = evento duplicado dentro da janela.
    async fn insert_if_fresh(
        &self,
        log: &NewAttendanceLog,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<AttendanceLog>, AppError>;

    async fn insert(&self, log: &NewAttendanceLog) -> Result<AttendanceLog, AppError>;

    /// Notifica a conta de usuário com o mesmo e-mail na empresa. `false` se não houver conta.
    async fn notify_by_email(
        &self,
        company_id: Uuid,
        email: &str,
        kind: NotificationType,
        title: &str,
        message: &str,
    ) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: PgPool,
    attendance_repo: AttendanceRepository,
    employee_repo: EmployeeRepository,
    shift_repo: ShiftRepository,
    company_repo: CompanyRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
}

impl PgAttendanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            attendance_repo: AttendanceRepository::new(pool.clone()),
            employee_repo: EmployeeRepository::new(pool.clone()),
            shift_repo: ShiftRepository::new(pool.clone()),
            company_repo: CompanyRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool.clone()),
            notification_repo: NotificationRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn location_timezone(&self, company_id: Uuid, location_id: Uuid) -> Result<Option<String>, AppError> {
        let location = self
            .company_repo
            .find_location(&self.pool, company_id, location_id)
            .await?;
        Ok(location.map(|l| l.timezone))
    }

    async fn employee(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<RosterEntry>, AppError> {
        let Some(employee) = self.employee_repo.find(&self.pool, company_id, employee_id).await? else {
            return Ok(None);
        };

        let shift = match employee.shift_id {
            Some(shift_id) => self
                .shift_repo
                .find(&self.pool, company_id, shift_id)
                .await?
                .map(|s| ShiftWindow::from(&s)),
            None => None,
        };

        Ok(Some(RosterEntry {
            id: employee.id,
            full_name: employee.full_name(),
            code: employee.employee_code.clone(),
            email: employee.email.clone(),
            active: employee.status.is_active(),
            shift,
        }))
    }

    async fn camera_in_company(&self, company_id: Uuid, camera_id: Uuid) -> Result<bool, AppError> {
        match ensure_in_company(&self.pool, OwnedTable::Camera, camera_id, company_id).await {
            Ok(()) => Ok(true),
            Err(AppError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn insert_if_fresh(
        &self,
        log: &NewAttendanceLog,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<AttendanceLog>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Dois eventos simultâneos da mesma chave não passam juntos pela verificação.
        self.attendance_repo
            .lock_dedup_key(&mut *tx, log.company_id, log.employee_id, log.location_id)
            .await?;

        let duplicate = self
            .attendance_repo
            .exists_since(&mut *tx, log.company_id, log.employee_id, log.location_id, cutoff)
            .await?;
        if duplicate {
            return Ok(None);
        }

        let row = self.attendance_repo.insert(&mut *tx, log).await?;
        tx.commit().await?;
        Ok(Some(row))
    }

    async fn insert(&self, log: &NewAttendanceLog) -> Result<AttendanceLog, AppError> {
        self.attendance_repo.insert(&self.pool, log).await
    }

    async fn notify_by_email(
        &self,
        company_id: Uuid,
        email: &str,
        kind: NotificationType,
        title: &str,
        message: &str,
    ) -> Result<bool, AppError> {
        let Some(user_id) = self
            .user_repo
            .find_id_in_company_by_email(&self.pool, company_id, email)
            .await?
        else {
            return Ok(false);
        };

        let notification = NewNotification {
            user_id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            data: None,
        };
        self.notification_repo.insert(&self.pool, company_id, &notification).await?;
        Ok(true)
    }
}

// =============================================================================
//  REGISTRADOR
// =============================================================================

#[derive(Clone)]
pub struct AttendanceRecorder {
    store: Arc<dyn AttendanceStore>,
    face: Arc<dyn FaceRecognition>,
}

impl AttendanceRecorder {
    pub fn new(store: Arc<dyn AttendanceStore>, face: Arc<dyn FaceRecognition>) -> Self {
        Self { store, face }
    }

    /// Quiosque: identifica o rosto, deduplica, calcula métricas do turno e grava.
    pub async fn kiosk_check_in(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        kind: AttendanceType,
        image: ImageUpload,
        captured_at: DateTime<Utc>,
    ) -> Result<KioskCheckInResponse, AppError> {
        let timezone = self
            .store
            .location_timezone(company_id, location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;

        let (employee_id, confidence) = match self.face.identify(company_id, image).await {
            IdentifyResult::Identified { employee_id, confidence } => (employee_id, confidence),
            IdentifyResult::NotIdentified { reason, confidence } => {
                return Ok(KioskCheckInResponse::not_identified(reason, confidence));
            }
            IdentifyResult::ServiceError(e) => return Err(e.into_app_error(MSG_IDENTIFY_FAILED)),
        };

        // O serviço facial pode devolver um id de outra empresa ou de alguém desligado.
        let employee = match self.store.employee(company_id, employee_id).await? {
            Some(e) if e.active => e,
            _ => {
                return Ok(KioskCheckInResponse::not_identified("Employee not found or inactive", None));
            }
        };

        let wall_clock = local_wall_clock(captured_at, &timezone);
        let metrics = compute_metrics(employee.shift.as_ref(), wall_clock, kind);

        let log = NewAttendanceLog {
            company_id,
            employee_id: employee.id,
            camera_id: None,
            location_id,
            kind,
            source: AttendanceSource::Kiosk,
            confidence: Some(confidence),
            metrics,
            captured_at,
        };

        let Some(_) = self.store.insert_if_fresh(&log, dedup_cutoff(captured_at)).await? else {
            tracing::info!("🔁 Ponto duplicado ignorado para {}", employee.code);
            return Ok(KioskCheckInResponse::duplicate(employee.full_name, employee.code));
        };

        self.notify_metrics(company_id, &employee, &metrics).await;

        tracing::info!("✅ {} registrado para {}", kind.label(), employee.code);
        Ok(KioskCheckInResponse::recorded(employee.full_name, employee.code, confidence, kind))
    }

    /// Lançamento manual: sem deduplicação e sem métricas.
    pub async fn manual_check_in(
        &self,
        company_id: Uuid,
        payload: &ManualCheckInPayload,
        captured_at: DateTime<Utc>,
    ) -> Result<AttendanceLog, AppError> {
        self.store
            .employee(company_id, payload.employee_id)
            .await?
            .ok_or(AppError::NotFound("Employee"))?;
        self.store
            .location_timezone(company_id, payload.location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;

        let log = NewAttendanceLog {
            company_id,
            employee_id: payload.employee_id,
            camera_id: None,
            location_id: payload.location_id,
            kind: payload.kind,
            source: AttendanceSource::Manual,
            confidence: None,
            metrics: AttendanceMetrics::default(),
            captured_at,
        };
        self.store.insert(&log).await
    }

    /// Callback do pipeline de câmeras. A empresa vem no corpo, não de sessão.
    pub async fn external_callback(
        &self,
        payload: &AttendanceCallbackPayload,
        captured_at: DateTime<Utc>,
    ) -> Result<AttendanceCallbackResponse, AppError> {
        let (Some(employee_id), Some(company_id), Some(location_id)) =
            (payload.employee_id, payload.company_id, payload.location_id)
        else {
            return Err(AppError::BadRequest("Missing required fields".into()));
        };

        match self.store.employee(company_id, employee_id).await? {
            Some(e) if e.active => {}
            _ => return Err(AppError::NotFound("Employee")),
        }
        self.store
            .location_timezone(company_id, location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;
        if let Some(camera_id) = payload.camera_id {
            if !self.store.camera_in_company(company_id, camera_id).await? {
                return Err(AppError::NotFound("Camera"));
            }
        }

        let log = NewAttendanceLog {
            company_id,
            employee_id,
            camera_id: payload.camera_id,
            location_id,
            kind: payload.kind.unwrap_or(AttendanceType::CheckIn),
            source: payload.source.unwrap_or(AttendanceSource::Rtsp),
            confidence: payload.confidence,
            metrics: AttendanceMetrics::default(),
            captured_at,
        };

        let inserted = self.store.insert_if_fresh(&log, dedup_cutoff(captured_at)).await?;
        Ok(AttendanceCallbackResponse { success: true, duplicate: inserted.is_none() })
    }

    /// Falha de notificação não desfaz o ponto já gravado.
    async fn notify_metrics(&self, company_id: Uuid, employee: &RosterEntry, metrics: &AttendanceMetrics) {
        let Some(email) = employee.email.as_deref() else {
            return;
        };

        let mut pending = Vec::new();
        if let (true, Some(minutes)) = (metrics.is_late, metrics.late_minutes) {
            pending.push((
                NotificationType::LateAlert,
                "Late Arrival",
                format!("You arrived {} minutes late today.", minutes),
            ));
        }
        if let (true, Some(minutes)) = (metrics.is_early_departure, metrics.early_departure_minutes) {
            pending.push((
                NotificationType::EarlyDeparture,
                "Early Departure",
                format!("You left {} minutes early today.", minutes),
            ));
        }

        for (kind, title, message) in pending {
            if let Err(e) = self.store.notify_by_email(company_id, email, kind, title, &message).await {
                tracing::warn!("⚠️ Falha ao notificar {}: {}", employee.code, e);
            }
        }
    }
}

// =============================================================================
//  SERVIÇO (registro + leituras)
// =============================================================================

#[derive(Clone)]
pub struct AttendanceService {
    recorder: AttendanceRecorder,
    attendance_repo: AttendanceRepository,
}

impl AttendanceService {
    pub fn new(recorder: AttendanceRecorder, attendance_repo: AttendanceRepository) -> Self {
        Self { recorder, attendance_repo }
    }

    pub async fn kiosk_check_in(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        kind: AttendanceType,
        image: ImageUpload,
    ) -> Result<KioskCheckInResponse, AppError> {
        self.recorder
            .kiosk_check_in(company_id, location_id, kind, image, Utc::now())
            .await
    }

    pub async fn manual_check_in(
        &self,
        company_id: Uuid,
        payload: &ManualCheckInPayload,
    ) -> Result<AttendanceLog, AppError> {
        self.recorder.manual_check_in(company_id, payload, Utc::now()).await
    }

    pub async fn external_callback(
        &self,
        payload: &AttendanceCallbackPayload,
    ) -> Result<AttendanceCallbackResponse, AppError> {
        self.recorder.external_callback(payload, Utc::now()).await
    }

    pub async fn list_logs(
        &self,
        company_id: Uuid,
        filters: &AttendanceFilters,
        page: PageParams,
    ) -> Result<Page<AttendanceLogItem>, AppError> {
        let (items, total) = self.attendance_repo.list(company_id, filters, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn recent(&self, company_id: Uuid, limit: Option<i64>) -> Result<Vec<RecentActivityItem>, AppError> {
        let limit = limit.unwrap_or(RECENT_DEFAULT_LIMIT).clamp(1, RECENT_MAX_LIMIT);
        self.attendance_repo.recent(company_id, limit).await
    }

    /// "Hoje" começa à meia-noite UTC.
    pub async fn today(&self, company_id: Uuid) -> Result<TodayStats, AppError> {
        let today = Utc::now().date_naive();
        let (since, _) = day_bounds(today, today)?;
        self.attendance_repo.today_stats(company_id, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::face_client::{ActionReply, DetectReply, EnrollmentReply, FaceServiceError, StreamStartRequest};
    use chrono::{NaiveTime, TimeZone};
    use std::sync::Mutex;

    // --- Dublês ---

    enum FakeIdentify {
        Hit(Uuid, f64),
        Miss(&'static str),
        Down,
    }

    struct FakeFace(FakeIdentify);

    #[async_trait]
    impl FaceRecognition for FakeFace {
        async fn identify(&self, _company_id: Uuid, _image: ImageUpload) -> IdentifyResult {
            match &self.0 {
                FakeIdentify::Hit(id, conf) => IdentifyResult::Identified { employee_id: *id, confidence: *conf },
                FakeIdentify::Miss(reason) => IdentifyResult::NotIdentified {
                    reason: reason.to_string(),
                    confidence: Some(0.41),
                },
                FakeIdentify::Down => IdentifyResult::ServiceError(FaceServiceError::Unreachable("recusado".into())),
            }
        }

        async fn enroll(&self, _: Uuid, _: Uuid, _: Vec<ImageUpload>) -> Result<EnrollmentReply, FaceServiceError> {
            unreachable!()
        }

        async fn remove_enrollment(&self, _: Uuid, _: Uuid) -> Result<(), FaceServiceError> {
            unreachable!()
        }

        async fn detect(&self, _: ImageUpload) -> Result<DetectReply, FaceServiceError> {
            unreachable!()
        }

        async fn test_rtsp(&self, _: &str) -> Result<ActionReply, FaceServiceError> {
            unreachable!()
        }

        async fn start_stream(&self, _: StreamStartRequest) -> Result<ActionReply, FaceServiceError> {
            unreachable!()
        }

        async fn stop_stream(&self, _: Uuid) -> Result<ActionReply, FaceServiceError> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        company_id: Uuid,
        location_id: Uuid,
        timezone: String,
        employees: Vec<RosterEntry>,
        linked_emails: Vec<String>,
        logs: Mutex<Vec<AttendanceLog>>,
        notifications: Mutex<Vec<(String, NotificationType, String)>>,
    }

    impl MemoryStore {
        fn row(log: &NewAttendanceLog) -> AttendanceLog {
            AttendanceLog {
                id: Uuid::new_v4(),
                company_id: log.company_id,
                employee_id: log.employee_id,
                camera_id: log.camera_id,
                location_id: log.location_id,
                kind: log.kind,
                source: log.source,
                confidence: log.confidence,
                is_late: log.metrics.is_late,
                late_minutes: log.metrics.late_minutes,
                is_early_departure: log.metrics.is_early_departure,
                early_departure_minutes: log.metrics.early_departure_minutes,
                overtime_minutes: log.metrics.overtime_minutes,
                captured_at: log.captured_at,
                created_at: log.captured_at,
            }
        }
    }

    #[async_trait]
    impl AttendanceStore for MemoryStore {
        async fn location_timezone(&self, company_id: Uuid, location_id: Uuid) -> Result<Option<String>, AppError> {
            Ok((company_id == self.company_id && location_id == self.location_id).then(|| self.timezone.clone()))
        }

        async fn employee(&self, company_id: Uuid, employee_id: Uuid) -> Result<Option<RosterEntry>, AppError> {
            if company_id != self.company_id {
                return Ok(None);
            }
            Ok(self.employees.iter().find(|e| e.id == employee_id).cloned())
        }

        async fn camera_in_company(&self, _company_id: Uuid, _camera_id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }

        async fn insert_if_fresh(
            &self,
            log: &NewAttendanceLog,
            cutoff: DateTime<Utc>,
        ) -> Result<Option<AttendanceLog>, AppError> {
            let mut logs = self.logs.lock().unwrap();
            let duplicate = logs.iter().any(|l| {
                l.company_id == log.company_id
                    && l.employee_id == log.employee_id
                    && l.location_id == log.location_id
                    && l.captured_at >= cutoff
            });
            if duplicate {
                return Ok(None);
            }
            let row = Self::row(log);
            logs.push(row.clone());
            Ok(Some(row))
        }

        async fn insert(&self, log: &NewAttendanceLog) -> Result<AttendanceLog, AppError> {
            let row = Self::row(log);
            self.logs.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn notify_by_email(
            &self,
            _company_id: Uuid,
            email: &str,
            kind: NotificationType,
            _title: &str,
            message: &str,
        ) -> Result<bool, AppError> {
            if !self.linked_emails.iter().any(|e| e == email) {
                return Ok(false);
            }
            self.notifications
                .lock()
                .unwrap()
                .push((email.to_string(), kind, message.to_string()));
            Ok(true)
        }
    }

    // --- Cenário ---

    fn ana(active: bool) -> RosterEntry {
        RosterEntry {
            id: Uuid::new_v4(),
            full_name: "Ana Souza".into(),
            code: "EMP-001".into(),
            email: Some("ana@acme.test".into()),
            active,
            shift: Some(ShiftWindow::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                15,
            )),
        }
    }

    fn store_with(employee: RosterEntry) -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            company_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            timezone: "UTC".into(),
            employees: vec![employee],
            linked_emails: vec!["ana@acme.test".into()],
            ..Default::default()
        })
    }

    fn image() -> ImageUpload {
        ImageUpload { file_name: "frame.jpg".into(), content_type: Some("image/jpeg".into()), bytes: vec![0xFF, 0xD8] }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn recorder(store: &Arc<MemoryStore>, face: FakeIdentify) -> AttendanceRecorder {
        AttendanceRecorder::new(store.clone(), Arc::new(FakeFace(face)))
    }

    // --- Quiosque ---

    #[tokio::test]
    async fn unrecognized_face_is_reported_not_stored() {
        let store = store_with(ana(true));
        let rec = recorder(&store, FakeIdentify::Miss("No face detected"));

        let resp = rec
            .kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckIn, image(), at(9, 0))
            .await
            .unwrap();

        assert!(!resp.identified);
        assert_eq!(resp.message, "No face detected");
        assert_eq!(resp.confidence, Some(0.41));
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn late_check_in_is_recorded_with_metrics_and_notifies() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Hit(emp.id, 0.93));

        let resp = rec
            .kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckIn, image(), at(9, 20))
            .await
            .unwrap();

        assert_eq!(resp, KioskCheckInResponse::recorded("Ana Souza".into(), "EMP-001".into(), 0.93, AttendanceType::CheckIn));
        assert_eq!(resp.message, "Check-in successful");

        let logs = store.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_late);
        assert_eq!(logs[0].late_minutes, Some(20));
        assert_eq!(logs[0].source, AttendanceSource::Kiosk);

        let notes = store.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].1, NotificationType::LateAlert);
        assert_eq!(notes[0].2, "You arrived 20 minutes late today.");
    }

    #[tokio::test]
    async fn on_time_check_in_does_not_notify() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Hit(emp.id, 0.9));

        rec.kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckIn, image(), at(9, 10))
            .await
            .unwrap();

        assert!(!store.logs.lock().unwrap()[0].is_late);
        assert!(store.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeat_within_window_is_duplicate_and_after_window_is_stored() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Hit(emp.id, 0.9));
        let (company, location) = (store.company_id, store.location_id);

        rec.kiosk_check_in(company, location, AttendanceType::CheckIn, image(), at(9, 0)).await.unwrap();

        // Tipo diferente não escapa da janela.
        let dup = rec
            .kiosk_check_in(company, location, AttendanceType::CheckOut, image(), at(9, 4))
            .await
            .unwrap();
        assert_eq!(dup.duplicate, Some(true));
        assert_eq!(dup.message, "Already checked in recently");
        assert_eq!(store.logs.lock().unwrap().len(), 1);

        let later = rec
            .kiosk_check_in(company, location, AttendanceType::CheckOut, image(), at(9, 6))
            .await
            .unwrap();
        assert_eq!(later.duplicate, Some(false));
        assert_eq!(store.logs.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn inactive_employee_is_treated_as_unidentified() {
        let emp = ana(false);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Hit(emp.id, 0.99));

        let resp = rec
            .kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckIn, image(), at(9, 0))
            .await
            .unwrap();

        assert!(!resp.identified);
        assert_eq!(resp.message, "Employee not found or inactive");
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn face_service_down_is_503_and_nothing_persists() {
        let store = store_with(ana(true));
        let rec = recorder(&store, FakeIdentify::Down);

        let err = rec
            .kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckIn, image(), at(9, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FaceServiceUnavailable(ref m) if m == "Face recognition service is not running."));
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_location_is_not_found() {
        let store = store_with(ana(true));
        let rec = recorder(&store, FakeIdentify::Down);

        let err = rec
            .kiosk_check_in(store.company_id, Uuid::new_v4(), AttendanceType::CheckIn, image(), at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Location")));
    }

    #[tokio::test]
    async fn early_check_out_notifies_departure() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Hit(emp.id, 0.9));

        rec.kiosk_check_in(store.company_id, store.location_id, AttendanceType::CheckOut, image(), at(17, 30))
            .await
            .unwrap();

        let notes = store.notifications.lock().unwrap();
        assert_eq!(notes[0].1, NotificationType::EarlyDeparture);
        assert_eq!(notes[0].2, "You left 30 minutes early today.");
    }

    // --- Manual e callback ---

    #[tokio::test]
    async fn manual_entries_skip_dedup_and_metrics() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Down);
        let payload = ManualCheckInPayload {
            employee_id: emp.id,
            location_id: store.location_id,
            kind: AttendanceType::CheckIn,
        };

        rec.manual_check_in(store.company_id, &payload, at(11, 0)).await.unwrap();
        let second = rec.manual_check_in(store.company_id, &payload, at(11, 1)).await.unwrap();

        assert_eq!(second.source, AttendanceSource::Manual);
        assert!(!second.is_late);
        assert_eq!(store.logs.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn callback_defaults_and_dedup() {
        let emp = ana(true);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Down);
        let payload = AttendanceCallbackPayload {
            employee_id: Some(emp.id),
            camera_id: None,
            company_id: Some(store.company_id),
            location_id: Some(store.location_id),
            confidence: Some(0.88),
            kind: None,
            source: None,
        };

        let first = rec.external_callback(&payload, at(8, 0)).await.unwrap();
        assert!(first.success && !first.duplicate);
        let second = rec.external_callback(&payload, at(8, 2)).await.unwrap();
        assert!(second.success && second.duplicate);

        let logs = store.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, AttendanceType::CheckIn);
        assert_eq!(logs[0].source, AttendanceSource::Rtsp);
        assert_eq!(logs[0].late_minutes, None);
    }

    #[tokio::test]
    async fn callback_requires_ids_and_active_employee() {
        let emp = ana(false);
        let store = store_with(emp.clone());
        let rec = recorder(&store, FakeIdentify::Down);

        let missing = AttendanceCallbackPayload {
            employee_id: None,
            camera_id: None,
            company_id: Some(store.company_id),
            location_id: Some(store.location_id),
            confidence: None,
            kind: None,
            source: None,
        };
        assert!(matches!(rec.external_callback(&missing, at(8, 0)).await, Err(AppError::BadRequest(_))));

        let inactive = AttendanceCallbackPayload { employee_id: Some(emp.id), ..missing };
        assert!(matches!(rec.external_callback(&inactive, at(8, 0)).await, Err(AppError::NotFound("Employee"))));
    }

    #[test]
    fn cutoff_is_five_minutes_back() {
        assert_eq!(dedup_cutoff(at(9, 5)), at(9, 0));
    }
}
