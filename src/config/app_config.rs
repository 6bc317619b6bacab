//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::types::AuthConfig;
use crate::error::{Context, Result};

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 数据库配置
    #[serde(default)]
    pub database: super::DatabaseConfig,
    /// 认证配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 结账金额配置
    #[serde(default)]
    pub checkout: super::CheckoutConfig,
}

impl AppConfig {
    /// 从 TOML 文件加载配置，缺失文件时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("解析配置文件失败: {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 环境变量优先于文件配置
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MARKET_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = std::env::var("MARKET_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        crate::ensure_validation!(!self.database.url.is_empty(), "Database URL cannot be empty");
        crate::ensure_validation!(
            self.database.max_connections > 0,
            "Database max_connections must be greater than 0"
        );
        crate::ensure_validation!(
            !self.auth.jwt_secret.is_empty(),
            "JWT secret cannot be empty"
        );
        crate::ensure_validation!(
            self.auth.jwt_expires_in > 0,
            "JWT expiry must be greater than 0"
        );
        crate::ensure_validation!(
            !self.checkout.tax_rate.is_sign_negative()
                && !self.checkout.shipping_fee.is_sign_negative()
                && !self.checkout.free_shipping_threshold.is_sign_negative(),
            "Checkout amounts cannot be negative"
        );
        Ok(())
    }
}
