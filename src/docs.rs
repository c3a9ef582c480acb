// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Onboarding / Dashboard ---
        handlers::company::onboard,
        handlers::company::dashboard_stats,

        // --- Locations ---
        handlers::company::list_locations,
        handlers::company::create_location,
        handlers::company::update_location,
        handlers::company::delete_location,

        // --- Departments ---
        handlers::company::list_departments,
        handlers::company::create_department,
        handlers::company::update_department,
        handlers::company::delete_department,

        // --- Shifts ---
        handlers::shifts::list_shifts,
        handlers::shifts::create_shift,
        handlers::shifts::update_shift,
        handlers::shifts::delete_shift,
        handlers::shifts::assign_shift,

        // --- Employees ---
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::create_employee,
        handlers::employees::update_employee,
        handlers::employees::deactivate_employee,
        handlers::employees::enroll_face,
        handlers::employees::remove_face,
        handlers::employees::detect_face,

        // --- Cameras ---
        handlers::cameras::list_cameras,
        handlers::cameras::create_camera,
        handlers::cameras::update_camera,
        handlers::cameras::delete_camera,
        handlers::cameras::set_camera_status,
        handlers::cameras::test_connection,
        handlers::cameras::start_stream,
        handlers::cameras::stop_stream,

        // --- Attendance ---
        handlers::attendance::kiosk_check_in,
        handlers::attendance::manual_check_in,
        handlers::attendance::external_callback,
        handlers::attendance::list_logs,
        handlers::attendance::recent_activity,
        handlers::attendance::today_stats,

        // --- Leaves ---
        handlers::leaves::list_leaves,
        handlers::leaves::my_employee,
        handlers::leaves::apply_leave,
        handlers::leaves::approve_leave,
        handlers::leaves::reject_leave,
        handlers::leaves::cancel_leave,
        handlers::leaves::list_balances,
        handlers::leaves::list_leave_types,
        handlers::leaves::create_leave_type,
        handlers::leaves::update_leave_type,
        handlers::leaves::delete_leave_type,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,

        // --- Reports ---
        handlers::reports::attendance_overview,
        handlers::reports::department_analytics,
        handlers::reports::leave_analytics,
        handlers::reports::punctuality,
        handlers::reports::employee_detail,
        handlers::reports::filter_options,
        handlers::reports::create_share,
        handlers::reports::list_shares,
        handlers::reports::delete_share,

        // --- Public Reports ---
        handlers::reports::public_report,
        handlers::embed::embed_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Company ---
            models::company::Company,
            models::company::Location,
            models::company::Department,
            models::company::DepartmentListItem,
            models::company::OnboardingPayload,
            models::company::OnboardingResponse,
            models::company::LocationPayload,
            models::company::DepartmentPayload,

            // --- Shifts ---
            models::shift::Shift,
            models::shift::ShiftListItem,
            models::shift::ShiftPayload,
            models::shift::AssignShiftPayload,

            // --- Employees ---
            models::employee::EmployeeStatus,
            models::employee::Employee,
            models::employee::EmployeeListItem,
            models::employee::EmployeePayload,
            models::employee::EnrollmentResult,
            models::employee::DetectionResult,

            // --- Cameras ---
            models::camera::CameraStatus,
            models::camera::Camera,
            models::camera::CameraListItem,
            models::camera::CameraPayload,
            models::camera::CameraStatusPayload,
            models::camera::TestRtspPayload,
            models::camera::CameraActionResponse,

            // --- Attendance ---
            models::attendance::AttendanceType,
            models::attendance::AttendanceSource,
            models::attendance::AttendanceLog,
            models::attendance::AttendanceMetrics,
            models::attendance::AttendanceLogItem,
            models::attendance::RecentActivityItem,
            models::attendance::TodayStats,
            models::attendance::ManualCheckInPayload,
            models::attendance::AttendanceCallbackPayload,
            models::attendance::AttendanceCallbackResponse,
            models::attendance::KioskCheckInResponse,

            // --- Leaves ---
            models::leave::LeaveStatus,
            models::leave::LeaveType,
            models::leave::LeaveBalance,
            models::leave::LeaveBalanceView,
            models::leave::Leave,
            models::leave::LeaveListItem,
            models::leave::ApplyLeavePayload,
            models::leave::RejectLeavePayload,
            models::leave::LeaveTypePayload,

            // --- Notifications ---
            models::notification::NotificationType,
            models::notification::Notification,
            models::notification::UnreadCount,

            // --- Reports ---
            models::report::ReportKind,
            models::report::ReportFilters,
            models::report::DateRange,
            models::report::DailyTrendPoint,
            models::report::OverviewSummary,
            models::report::PieSlice,
            models::report::AttendanceOverview,
            models::report::DepartmentStat,
            models::report::DepartmentAnalytics,
            models::report::LeaveByType,
            models::report::LeaveMonthPoint,
            models::report::LeaveSummary,
            models::report::LeaveAnalytics,
            models::report::LateEmployee,
            models::report::WeeklyPunctuality,
            models::report::PunctualitySummary,
            models::report::PunctualityReport,
            models::report::EmployeeHeader,
            models::report::MonthlyAttendance,
            models::report::BalanceLine,
            models::report::EmployeeLogLine,
            models::report::EmployeeDetailReport,
            models::report::ReportData,
            models::report::ReportShare,
            models::report::CreateSharePayload,
            models::report::CreateShareResponse,
            models::report::PublicReportResponse,
            models::report::NamedOption,
            models::report::EmployeeOption,
            models::report::FilterOptions,
            models::report::DashboardStats,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Onboarding", description = "Criação da empresa e da primeira unidade"),
        (name = "Dashboard", description = "Indicadores do painel"),
        (name = "Locations", description = "Unidades da empresa"),
        (name = "Departments", description = "Departamentos"),
        (name = "Shifts", description = "Turnos de trabalho"),
        (name = "Employees", description = "Funcionários e cadastro facial"),
        (name = "Cameras", description = "Câmeras RTSP e streams"),
        (name = "Attendance", description = "Registros de ponto"),
        (name = "Leaves", description = "Pedidos de afastamento e saldos"),
        (name = "Leave Types", description = "Tipos de afastamento"),
        (name = "Notifications", description = "Notificações in-app"),
        (name = "Reports", description = "Relatórios gerenciais e compartilhamento"),
        (name = "Public Reports", description = "Relatórios compartilhados (sem login)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
