//! # 结账金额配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 结账金额参数：税率、运费与包邮门槛
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// 税率（0.10 即 10%）
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
    /// 不足包邮门槛时收取的运费
    #[serde(default = "default_shipping_fee")]
    pub shipping_fee: Decimal,
    /// 小计达到该金额免运费
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: Decimal,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            shipping_fee: default_shipping_fee(),
            free_shipping_threshold: default_free_shipping_threshold(),
        }
    }
}

fn default_tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

fn default_shipping_fee() -> Decimal {
    Decimal::new(500, 2)
}

fn default_free_shipping_threshold() -> Decimal {
    Decimal::new(5000, 2)
}
