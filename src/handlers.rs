pub mod attendance;
pub mod auth;
pub mod cameras;
pub mod company;
pub mod embed;
pub mod employees;
pub mod leaves;
pub mod notifications;
pub mod reports;
pub mod shifts;
pub mod upload;
