pub mod download_controller;
pub mod health_controller;
