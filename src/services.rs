pub mod auth;
pub mod face_client;
pub mod shift_metrics;
pub mod leave_workflow;
pub mod company_service;
pub mod employee_service;
pub mod shift_service;
pub mod camera_service;
pub mod attendance_service;
pub mod leave_service;
pub mod notification_service;
pub mod report_service;
