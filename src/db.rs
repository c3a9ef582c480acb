pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod shift_repo;
pub use shift_repo::ShiftRepository;
pub mod camera_repo;
pub use camera_repo::CameraRepository;
pub mod attendance_repo;
pub use attendance_repo::AttendanceRepository;
pub mod leave_repo;
pub use leave_repo::LeaveRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
