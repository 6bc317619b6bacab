//! # 配置模块
//!
//! 应用配置的加载、校验与环境变量覆盖

pub mod app_config;
pub mod checkout;
pub mod database;

pub use app_config::AppConfig;
pub use checkout::CheckoutConfig;
pub use database::DatabaseConfig;
