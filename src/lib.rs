//! # 多商户电商后端核心库
//!
//! 账户、商户、商品目录、购物车与订单的业务服务层，
//! 基于 Sea-ORM 与 SQLite，所有金额使用 Decimal。

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod seed;
pub mod services;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{MarketError, Result};
