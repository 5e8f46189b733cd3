// API request and response models
pub mod auth;
pub mod common;
pub mod org_chart;
pub mod user;
