pub mod attendance;
pub mod auth;
pub mod camera;
pub mod company;
pub mod employee;
pub mod leave;
pub mod notification;
pub mod report;
pub mod shift;
